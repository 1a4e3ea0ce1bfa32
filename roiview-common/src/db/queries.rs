//! Queries for the export job

use crate::db::models::{Core, ReviewStep, Slide};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Load every review step with a completion timestamp.
///
/// With `exclude_rejected`, only steps whose slide evaluation marks the
/// slide adequate are kept; a step without an evaluation row counts as
/// rejected. Order is as returned by storage.
pub async fn load_completed_steps(
    db: &SqlitePool,
    exclude_rejected: bool,
) -> Result<Vec<ReviewStep>> {
    let sql = if exclude_rejected {
        "SELECT s.id, s.label, s.slide_id, s.completion_date \
         FROM rois_annotation_step s \
         JOIN slide_evaluation e ON e.rois_annotation_step_id = s.id \
         WHERE s.completion_date IS NOT NULL AND e.adequate_slide != 0"
    } else {
        "SELECT s.id, s.label, s.slide_id, s.completion_date \
         FROM rois_annotation_step s \
         WHERE s.completion_date IS NOT NULL"
    };

    let rows = sqlx::query_as::<_, (i64, String, String, Option<DateTime<Utc>>)>(sql)
        .fetch_all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, label, slide_id, completion_date)| ReviewStep {
            id,
            label,
            slide_id,
            completion_date,
        })
        .collect())
}

/// Load one slide by id.
pub async fn load_slide(db: &SqlitePool, slide_id: &str) -> Result<Slide> {
    let row = sqlx::query_as::<_, (String, String, Option<i64>)>(
        "SELECT id, image_type, omero_id FROM slide WHERE id = ?",
    )
    .bind(slide_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some((id, image_type, omero_id)) => Ok(Slide {
            id,
            image_type,
            omero_id,
        }),
        None => Err(Error::NotFound(format!("slide {}", slide_id))),
    }
}

/// Load the cores of a review step, joined through their slice, each with
/// the number of focus regions annotated inside it.
pub async fn load_cores_for_step(db: &SqlitePool, step_id: i64) -> Result<Vec<Core>> {
    let rows = sqlx::query_as::<_, (i64, String, i64, String, String, i64)>(
        "SELECT c.id, c.label, c.slice_id, c.author, c.roi_json, \
                (SELECT COUNT(*) FROM focus_region f WHERE f.core_id = c.id) \
                    AS focus_regions_count \
         FROM core c \
         JOIN slice sl ON sl.id = c.slice_id \
         WHERE sl.rois_annotation_step_id = ? \
         ORDER BY c.id",
    )
    .bind(step_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, label, slice_id, author, roi_json, focus_regions_count)| Core {
                id,
                label,
                slice_id,
                author,
                roi_json,
                focus_regions_count,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    const SCHEMA: &str = "
        CREATE TABLE rois_annotation_step (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            slide_id TEXT NOT NULL,
            completion_date TEXT
        );
        CREATE TABLE slide_evaluation (
            rois_annotation_step_id INTEGER NOT NULL,
            adequate_slide INTEGER NOT NULL
        );
        CREATE TABLE slide (
            id TEXT PRIMARY KEY,
            image_type TEXT NOT NULL,
            omero_id INTEGER
        );
        CREATE TABLE slice (
            id INTEGER PRIMARY KEY,
            rois_annotation_step_id INTEGER NOT NULL
        );
        CREATE TABLE core (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            slice_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            roi_json TEXT NOT NULL
        );
        CREATE TABLE focus_region (
            id INTEGER PRIMARY KEY,
            core_id INTEGER NOT NULL
        );
    ";

    /// Single-connection in-memory pool; a larger pool would hand each
    /// connection its own empty database.
    async fn fixture_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::raw_sql(SCHEMA).execute(&pool).await.expect("schema");
        pool
    }

    #[tokio::test]
    async fn only_completed_steps_are_loaded() {
        let pool = fixture_pool().await;
        sqlx::raw_sql(
            "INSERT INTO rois_annotation_step VALUES
                (1, 'r1_s1', 'SLIDE-1', '2024-03-14T10:30:00Z'),
                (2, 'r1_s2', 'SLIDE-2', NULL);",
        )
        .execute(&pool)
        .await
        .unwrap();

        let steps = load_completed_steps(&pool, false).await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, 1);
        assert_eq!(steps[0].label, "r1_s1");
        assert!(steps[0].completion_date.is_some());
    }

    #[tokio::test]
    async fn exclude_rejected_keeps_only_adequate_steps() {
        let pool = fixture_pool().await;
        sqlx::raw_sql(
            "INSERT INTO rois_annotation_step VALUES
                (1, 'adequate', 'SLIDE-1', '2024-03-14T10:30:00Z'),
                (2, 'rejected', 'SLIDE-2', '2024-03-14T11:00:00Z'),
                (3, 'unreviewed', 'SLIDE-3', '2024-03-14T11:30:00Z');
             INSERT INTO slide_evaluation VALUES (1, 1), (2, 0);",
        )
        .execute(&pool)
        .await
        .unwrap();

        let steps = load_completed_steps(&pool, true).await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].label, "adequate");

        // Without the flag all three completed steps come back.
        let steps = load_completed_steps(&pool, false).await.unwrap();
        assert_eq!(steps.len(), 3);
    }

    #[tokio::test]
    async fn cores_join_through_their_slice_with_focus_counts() {
        let pool = fixture_pool().await;
        sqlx::raw_sql(
            "INSERT INTO rois_annotation_step VALUES
                (1, 'r1_s1', 'SLIDE-1', '2024-03-14T10:30:00Z');
             INSERT INTO slice VALUES (10, 1), (11, 99);
             INSERT INTO core VALUES
                (7, 'core_a', 10, 'alice', '{}'),
                (8, 'core_b', 10, 'bob', '{}'),
                (9, 'other_step', 11, 'carol', '{}');
             INSERT INTO focus_region VALUES (100, 7), (101, 7), (102, 9);",
        )
        .execute(&pool)
        .await
        .unwrap();

        let cores = load_cores_for_step(&pool, 1).await.unwrap();
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].id, 7);
        assert_eq!(cores[0].focus_regions_count, 2);
        assert_eq!(cores[1].id, 8);
        assert_eq!(cores[1].focus_regions_count, 0);
    }

    #[tokio::test]
    async fn unknown_slide_is_not_found() {
        let pool = fixture_pool().await;
        let result = load_slide(&pool, "SLIDE-404").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn slide_row_maps_fields() {
        let pool = fixture_pool().await;
        sqlx::raw_sql("INSERT INTO slide VALUES ('SLIDE-1', 'OMERO_IMG', 42);")
            .execute(&pool)
            .await
            .unwrap();

        let slide = load_slide(&pool, "SLIDE-1").await.unwrap();
        assert_eq!(slide.id, "SLIDE-1");
        assert_eq!(slide.image_type, "OMERO_IMG");
        assert_eq!(slide.omero_id, Some(42));
    }
}
