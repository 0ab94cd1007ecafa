use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::checkout_sheet::SheetKey;
use crate::models::photo::{
    ItemPhoto, NewItemPhoto, NewVehiclePhoto, PhotoContent, VehiclePhoto, VehiclePhotoCategory,
};
use crate::repositories::checkout_sheet_repository::lock_open_sheet;
use crate::repositories::PgStore;
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Guardar un lote de fotos de vehículo en una sola transacción.
    /// Una categoría repetida reemplaza la foto anterior (conserva el id).
    async fn upsert_vehicle_photos(
        &self,
        key: SheetKey,
        photos: &[NewVehiclePhoto],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VehiclePhoto>>;

    async fn insert_item_photo(
        &self,
        key: SheetKey,
        photo: &NewItemPhoto,
        now: DateTime<Utc>,
    ) -> AppResult<ItemPhoto>;

    async fn vehicle_photos(&self, key: SheetKey) -> AppResult<Vec<VehiclePhoto>>;

    async fn item_photos(&self, key: SheetKey) -> AppResult<Vec<ItemPhoto>>;

    /// Bytes crudos de una foto (de vehículo o de ítem) por id
    async fn photo_content(&self, photo_id: Uuid) -> AppResult<Option<PhotoContent>>;

    /// Categorías distintas presentes, leídas en una sola consulta
    async fn present_categories(&self, key: SheetKey) -> AppResult<Vec<VehiclePhotoCategory>>;
}

pub(crate) async fn present_categories_in(
    conn: &mut PgConnection,
    key: SheetKey,
) -> AppResult<Vec<VehiclePhotoCategory>> {
    let rows: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT category FROM vehicle_photos
        WHERE company_id = $1 AND sheet_id = $2
        "#,
    )
    .bind(key.company_id)
    .bind(key.sheet_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut categories = rows
        .into_iter()
        .map(|c| VehiclePhotoCategory::try_from(c).map_err(|e| AppError::Storage(e.to_string())))
        .collect::<AppResult<Vec<_>>>()?;
    categories.sort();
    Ok(categories)
}

#[async_trait]
impl PhotoRepository for PgStore {
    async fn upsert_vehicle_photos(
        &self,
        key: SheetKey,
        photos: &[NewVehiclePhoto],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VehiclePhoto>> {
        let mut tx = self.pool().begin().await?;
        lock_open_sheet(&mut tx, key).await?;

        let mut saved = Vec::with_capacity(photos.len());
        for new_photo in photos {
            let photo = sqlx::query_as::<_, VehiclePhoto>(
                r#"
                INSERT INTO vehicle_photos (
                    id, company_id, sheet_id, category, content, filename,
                    size_bytes, mime_type, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                ON CONFLICT (company_id, sheet_id, category) DO UPDATE SET
                    content = EXCLUDED.content,
                    filename = EXCLUDED.filename,
                    size_bytes = EXCLUDED.size_bytes,
                    mime_type = EXCLUDED.mime_type,
                    updated_at = EXCLUDED.updated_at
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(key.company_id)
            .bind(key.sheet_id)
            .bind(new_photo.category.as_str())
            .bind(&new_photo.photo.content)
            .bind(&new_photo.photo.filename)
            .bind(new_photo.photo.size_bytes())
            .bind(&new_photo.photo.mime_type)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(photo);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn insert_item_photo(
        &self,
        key: SheetKey,
        photo: &NewItemPhoto,
        now: DateTime<Utc>,
    ) -> AppResult<ItemPhoto> {
        let mut tx = self.pool().begin().await?;
        lock_open_sheet(&mut tx, key).await?;

        let saved = sqlx::query_as::<_, ItemPhoto>(
            r#"
            INSERT INTO item_photos (
                id, company_id, sheet_id, check_item_id, content, filename,
                size_bytes, mime_type, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.company_id)
        .bind(key.sheet_id)
        .bind(photo.check_item_id)
        .bind(&photo.photo.content)
        .bind(&photo.photo.filename)
        .bind(photo.photo.size_bytes())
        .bind(&photo.photo.mime_type)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn vehicle_photos(&self, key: SheetKey) -> AppResult<Vec<VehiclePhoto>> {
        let photos = sqlx::query_as::<_, VehiclePhoto>(
            r#"
            SELECT * FROM vehicle_photos
            WHERE company_id = $1 AND sheet_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_all(self.pool())
        .await?;

        Ok(photos)
    }

    async fn item_photos(&self, key: SheetKey) -> AppResult<Vec<ItemPhoto>> {
        let photos = sqlx::query_as::<_, ItemPhoto>(
            r#"
            SELECT * FROM item_photos
            WHERE company_id = $1 AND sheet_id = $2
            ORDER BY check_item_id, created_at, id
            "#,
        )
        .bind(key.company_id)
        .bind(key.sheet_id)
        .fetch_all(self.pool())
        .await?;

        Ok(photos)
    }

    async fn photo_content(&self, photo_id: Uuid) -> AppResult<Option<PhotoContent>> {
        let content = sqlx::query_as::<_, PhotoContent>(
            r#"
            SELECT content, mime_type, filename FROM vehicle_photos WHERE id = $1
            UNION ALL
            SELECT content, mime_type, filename FROM item_photos WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(photo_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(content)
    }

    async fn present_categories(&self, key: SheetKey) -> AppResult<Vec<VehiclePhotoCategory>> {
        let mut conn = self.pool().acquire().await?;
        present_categories_in(&mut conn, key).await
    }
}
