use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use workforce_desk::authz::{PermissionSet, RoleRef};
use workforce_desk::db;
use workforce_desk::utils::hash_password;

#[derive(Parser, Debug)]
#[command(author, version, about = "workforce-desk operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create a role; permissions are given as camelCase flag names
    CreateRole {
        name: String,
        #[arg(long)]
        department: Option<Uuid>,
        /// e.g. --allow canAssignTasks --allow canViewTasks
        #[arg(long = "allow")]
        allow: Vec<String>,
    },
    /// Create an employee with a password login
    CreateEmployee {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        position: Option<String>,
        /// Store the role as a reference to this role id
        #[arg(long, conflicts_with = "role_name")]
        role_id: Option<Uuid>,
        /// Store the role as a plain name
        #[arg(long)]
        role_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            db::MIGRATOR.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            print_status(&pool).await?;
        }
        Commands::CreateRole { name, department, allow } => {
            let pool = get_pool().await?;
            let permissions = permissions_from_flags(&allow)?;
            let id = create_role(&pool, &name, department, permissions).await?;
            println!("Created role {name} ({id})");
        }
        Commands::CreateEmployee {
            name,
            email,
            password,
            position,
            role_id,
            role_name,
        } => {
            let pool = get_pool().await?;
            let role = role_id.map(RoleRef::Id).or(role_name.map(RoleRef::Name));
            let id = create_employee(&pool, &name, &email, &password, position, role).await?;
            println!("Created employee {email} ({id})");
        }
    }

    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let filename = format!("{}_{}.sql", timestamp, sanitize_name(name));
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    db::connect(&database_url).await
}

async fn print_status(pool: &SqlitePool) -> anyhow::Result<()> {
    let has_table: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;

    let applied_versions: HashSet<i64> = if has_table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} Name", "Status", "Version");
    for migration in db::MIGRATOR.iter() {
        let status = if applied_versions.contains(&migration.version) {
            "applied"
        } else {
            "pending"
        };
        let desc = migration.description.trim();
        println!("{:<8} {:<20} {}", status, migration.version, if desc.is_empty() { "unknown" } else { desc });
    }

    Ok(())
}

fn permissions_from_flags(flags: &[String]) -> anyhow::Result<PermissionSet> {
    let mut doc = serde_json::Map::new();
    for flag in flags {
        doc.insert(flag.clone(), serde_json::Value::Bool(true));
    }

    let set: PermissionSet = serde_json::from_value(serde_json::Value::Object(doc))?;
    // unknown names are silently dropped by the lenient decoder, so check them here
    let known = serde_json::to_value(set)?;
    for flag in flags {
        if known.get(flag).is_none() {
            anyhow::bail!("unknown permission flag `{flag}`");
        }
    }

    Ok(set)
}

async fn create_role(
    pool: &SqlitePool,
    name: &str,
    department: Option<Uuid>,
    permissions: PermissionSet,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO roles (id, name, department_id, permissions, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(department)
    .bind(permissions.to_stored())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("failed to insert role")?;

    Ok(id)
}

async fn create_employee(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    position: Option<String>,
    role: Option<RoleRef>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let password_hash = hash_password(password)?;
    let (role_kind, role_value) = match role.as_ref().map(RoleRef::to_stored) {
        Some((kind, value)) => (Some(kind), Some(value)),
        None => (None, None),
    };

    sqlx::query(
        "INSERT INTO employees (id, name, email, position, department_id, password_hash, role_kind, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(email.trim().to_lowercase())
    .bind(position)
    .bind(password_hash)
    .bind(role_kind)
    .bind(role_value)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("failed to insert employee")?;

    Ok(id)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}
