use crate::db::{DbPool, OrmConn};

/// Shared handles for the request layer: the sqlx pool carries auth, audit,
/// and migrations; the SeaORM connection carries the entity layer and the
/// settlement transactions. Both point at the same database.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}
