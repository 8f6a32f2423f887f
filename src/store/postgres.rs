/// PostgreSQL store
///
/// Keeps one row per store path in `lake_levels.current_levels`
/// (see `sql/001_current_levels.sql`). A write replaces the row.

use postgres::{Client, NoTls};

use crate::model::{LevelRecord, StoreError};
use crate::store::LevelStore;

const UPSERT_LEVEL: &str = "
    INSERT INTO lake_levels.current_levels
        (path, name, max_level, level_date, today, yesterday, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, now())
    ON CONFLICT (path) DO UPDATE SET
        name = EXCLUDED.name,
        max_level = EXCLUDED.max_level,
        level_date = EXCLUDED.level_date,
        today = EXCLUDED.today,
        yesterday = EXCLUDED.yesterday,
        updated_at = EXCLUDED.updated_at
";

pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connects and checks that the levels table exists.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client = Client::connect(database_url, NoTls).map_err(database_error)?;
        let mut store = Self { client };
        store.verify_schema()?;
        Ok(store)
    }

    fn verify_schema(&mut self) -> Result<(), StoreError> {
        let row = self
            .client
            .query_one(
                "SELECT to_regclass('lake_levels.current_levels') IS NOT NULL",
                &[],
            )
            .map_err(database_error)?;
        let exists: bool = row.get(0);
        if !exists {
            return Err(StoreError::Database(
                "table lake_levels.current_levels not found; apply sql/001_current_levels.sql".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads back the row stored at `path`.
    pub fn get_record(&mut self, path: &str) -> Result<Option<LevelRecord>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT name, max_level, level_date, today, yesterday
                 FROM lake_levels.current_levels WHERE path = $1",
                &[&path],
            )
            .map_err(database_error)?;

        Ok(row.map(|row| LevelRecord {
            name: row.get(0),
            max_level: row.get(1),
            date: row.get(2),
            today: row.get(3),
            yesterday: row.get(4),
        }))
    }
}

impl LevelStore for PostgresStore {
    fn set_record(&mut self, path: &str, record: &LevelRecord) -> Result<(), StoreError> {
        self.client
            .execute(
                UPSERT_LEVEL,
                &[
                    &path,
                    &record.name,
                    &record.max_level,
                    &record.date,
                    &record.today,
                    &record.yesterday,
                ],
            )
            .map_err(database_error)?;
        Ok(())
    }
}

fn database_error(e: postgres::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
