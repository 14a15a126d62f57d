use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (students, swipes, matches, blocks)");
        conn.execute_batch(
            "
            CREATE TABLE students (
                id                      INTEGER PRIMARY KEY AUTOINCREMENT,
                email                   TEXT NOT NULL UNIQUE,
                password                TEXT NOT NULL,
                name                    TEXT NOT NULL,
                gender                  TEXT NOT NULL,
                date_of_birth           TEXT NOT NULL,
                min_age                 INTEGER NOT NULL DEFAULT 18,
                max_age                 INTEGER NOT NULL DEFAULT 99,
                max_distance_km         REAL,
                preferred_gender        TEXT,
                latitude                REAL,
                longitude               REAL,
                plan                    TEXT NOT NULL DEFAULT 'free',
                super_likes_remaining   INTEGER NOT NULL CHECK (super_likes_remaining >= 0),
                super_likes_reset_at    TEXT NOT NULL,
                rewinds_remaining       INTEGER NOT NULL CHECK (rewinds_remaining >= 0),
                rewinds_reset_at        TEXT NOT NULL,
                boosts_remaining        INTEGER NOT NULL CHECK (boosts_remaining >= 0),
                boosts_reset_at         TEXT NOT NULL,
                boosted_until           TEXT,
                is_banned               INTEGER NOT NULL DEFAULT 0,
                is_hidden               INTEGER NOT NULL DEFAULT 0,
                created_at              TEXT NOT NULL
            );

            CREATE TABLE swipes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                swiper_id       INTEGER NOT NULL REFERENCES students(id),
                swiped_id       INTEGER NOT NULL REFERENCES students(id),
                is_like         INTEGER NOT NULL,
                is_super_like   INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                UNIQUE(swiper_id, swiped_id),
                CHECK (swiper_id != swiped_id)
            );

            CREATE INDEX idx_swipes_swiper_recent
                ON swipes(swiper_id, created_at DESC, id DESC);

            CREATE TABLE matches (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                student1_id     INTEGER NOT NULL REFERENCES students(id),
                student2_id     INTEGER NOT NULL REFERENCES students(id),
                created_at      TEXT NOT NULL,
                is_active       INTEGER NOT NULL DEFAULT 1,
                UNIQUE(student1_id, student2_id),
                CHECK (student1_id < student2_id)
            );

            CREATE INDEX idx_matches_student2 ON matches(student2_id);

            CREATE TABLE blocks (
                blocker_id      INTEGER NOT NULL REFERENCES students(id),
                blocked_id      INTEGER NOT NULL REFERENCES students(id),
                created_at      TEXT NOT NULL,
                PRIMARY KEY (blocker_id, blocked_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
