use std::{fs, path::Path, str::FromStr};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::auth::{hash_password, new_id, verify_password};

pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool, admin_password: &str) -> Result<(), sqlx::Error> {
    seed_admin(pool, admin_password).await?;
    seed_services(pool).await?;
    Ok(())
}

/// Keeps the stored admin credential in step with the configured password.
async fn seed_admin(pool: &SqlitePool, admin_password: &str) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String, String)>(
        "SELECT id, password_hash FROM admin_credentials LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    if let Some((_, password_hash)) = &existing {
        if verify_password(admin_password, password_hash) {
            return Ok(());
        }
    }

    let password_hash = hash_password(admin_password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = chrono::Utc::now().to_rfc3339();

    match existing {
        Some((id, _)) => {
            sqlx::query("UPDATE admin_credentials SET password_hash = ?, created_at = ? WHERE id = ?")
                .bind(password_hash)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await?;
            // Sessions issued under the old password are no longer trusted.
            sqlx::query("DELETE FROM admin_sessions").execute(pool).await?;
            log::info!("Admin password changed; existing sessions revoked");
        }
        None => {
            sqlx::query("INSERT INTO admin_credentials (id, password_hash, created_at) VALUES (?, ?, ?)")
                .bind(new_id())
                .bind(password_hash)
                .bind(now)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

async fn seed_services(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let catalog: [(&str, f64, i64, &str); 13] = [
        ("Beard", 15.0, 20, "Professional beard trim and shaping"),
        ("Haircut & Beard", 40.0, 45, "Complete haircut with beard service"),
        ("Kid's Haircut", 30.0, 40, "Haircut for children"),
        ("Men's Haircut", 30.0, 30, "Classic men's haircut"),
        ("Skin Fade", 35.0, 30, "Precision skin fade haircut"),
        ("Head Shave", 30.0, 30, "Complete head shave"),
        ("Beard Shaping/Trim/Shave/Maintenance", 20.0, 25, "Comprehensive beard care"),
        ("Eyebrow Shaping", 10.0, 10, "Professional eyebrow grooming"),
        ("Straight Razor Shave", 20.0, 30, "Traditional straight razor shave"),
        ("Combo (Head Shave + Beard Trim)", 40.0, 45, "Head shave and beard trim combo"),
        ("Highlights", 70.0, 90, "Professional hair highlights"),
        ("Keratin Treatment", 70.0, 60, "Keratin smoothing treatment"),
        ("Brazilian Straightening", 55.0, 60, "Brazilian hair straightening"),
    ];

    for (position, (name, price, duration, description)) in catalog.into_iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO services (id, name, price, duration_minutes, description, position)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind(name)
        .bind(price)
        .bind(duration)
        .bind(description)
        .bind(position as i64)
        .execute(pool)
        .await?;
    }
    log::info!("Service catalog initialised");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::memory_pool;
    use super::*;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = memory_pool().await;
        seed_defaults(&pool, "secret").await.expect("first seed");
        seed_defaults(&pool, "secret").await.expect("second seed");

        let services = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(services, 13);
        let credentials = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_credentials")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(credentials, 1);
    }

    #[tokio::test]
    async fn changing_the_password_revokes_sessions() {
        let pool = memory_pool().await;
        seed_defaults(&pool, "first").await.expect("seed");
        sqlx::query("INSERT INTO admin_sessions (token, created_at) VALUES ('t', 'now')")
            .execute(&pool)
            .await
            .expect("insert session");

        seed_defaults(&pool, "second").await.expect("reseed");

        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM admin_credentials")
            .fetch_one(&pool)
            .await
            .expect("hash");
        assert!(verify_password("second", &hash));
        let sessions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_sessions")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(sessions, 0);
    }

    #[test]
    fn ensure_sqlite_dir_ignores_memory_urls() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://localhost/db").is_ok());
    }
}
