use sqlx::SqlitePool;

use crate::constants::Constants;
use crate::error::BookingError;
use crate::models::Course;

/// The course/discipline catalogue backing the booking form's selector.
#[derive(Debug, Clone)]
pub struct CourseStore {
    db: SqlitePool,
}

impl CourseStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> Result<Vec<Course>, BookingError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY name")
            .fetch_all(&self.db)
            .await
            .map_err(BookingError::from_db)
    }

    pub async fn create(
        &self,
        name: &str,
        color_hex: Option<&str>,
    ) -> Result<Course, BookingError> {
        validate_name(name)?;
        sqlx::query_as::<_, Course>(
            "INSERT INTO courses (name, color_hex) VALUES (?, ?) RETURNING *",
        )
        .bind(name.trim())
        .bind(color_hex)
        .fetch_one(&self.db)
        .await
        .map_err(BookingError::from_db)
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        color_hex: Option<&str>,
    ) -> Result<Course, BookingError> {
        validate_name(name)?;
        sqlx::query_as::<_, Course>(
            "UPDATE courses SET name = ?, color_hex = ? WHERE id = ? RETURNING *",
        )
        .bind(name.trim())
        .bind(color_hex)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(BookingError::from_db)?
        .ok_or(BookingError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(BookingError::from_db)?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound);
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), BookingError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BookingError::Validation("Course name is required.".into()));
    }
    if name.len() > Constants::MAX_COURSE_NAME_LENGTH {
        return Err(BookingError::Validation("Course name is too long.".into()));
    }
    Ok(())
}
