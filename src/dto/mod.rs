//! DTOs de la API HTTP
//!
//! Requests y responses de la frontera HTTP. Los requests se convierten a
//! los tipos de entrada de los servicios, que los validan una sola vez.

pub mod api_response;
pub mod authorization_dto;
pub mod checkout_sheet_dto;
pub mod evidence_dto;
pub mod sequence_dto;

pub use api_response::ApiResponse;
