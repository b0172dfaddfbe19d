//! Basic example of the Sanduq container.
//!
//! Run with `RUST_LOG=sanduq=debug cargo run --example basic` to see the
//! container's own logging.

use sanduq::prelude::*;
use std::sync::Arc;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

trait DatabaseProtocol: Send + Sync {
    fn name(&self) -> &str;
    fn query(&self, sql: &str) -> String;
}

struct PostgresDatabase {
    url: String,
    logger: Arc<dyn Logger>,
}

impl DatabaseProtocol for PostgresDatabase {
    fn name(&self) -> &str {
        "postgres"
    }

    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct SqliteDatabase {
    path: String,
}

impl DatabaseProtocol for SqliteDatabase {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn query(&self, sql: &str) -> String {
        format!("Results from {} for `{sql}`", self.path)
    }
}

#[derive(Clone)]
struct UserService {
    db: Arc<dyn DatabaseProtocol>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

// === Group registrations in a provider ===

struct DatabaseProvider;

impl Provider for DatabaseProvider {
    fn register(&self, services: &mut Services) -> std::result::Result<(), BoxError> {
        services.singleton::<Arc<dyn Logger>>(|_| Ok(Arc::new(ConsoleLogger)));

        services
            .singleton::<Arc<PostgresDatabase>>(|r| {
                let url = r
                    .environment()
                    .string_option("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set")?;
                Ok(Arc::new(PostgresDatabase { url, logger: r.make()? }))
            })
            .supports::<Arc<dyn DatabaseProtocol>>(|db| db);

        services
            .transient::<Arc<SqliteDatabase>>(|r| {
                let path = r.environment().string_option("DB_PATH").unwrap_or(":memory:".into());
                Ok(Arc::new(SqliteDatabase { path }))
            })
            .supports::<Arc<dyn DatabaseProtocol>>(|db| db);

        services.transient::<UserService>(|r| Ok(UserService { db: r.make()? }));
        Ok(())
    }

    fn did_boot(&self, container: &Container) {
        if let Ok(db) = container.make::<Arc<dyn DatabaseProtocol>>() {
            println!("🔌 Booted with {}", db.name());
        }
    }

    fn will_shutdown(&self, _container: &Container) {
        println!("👋 Closing database connections");
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut environment = Environment::development();
    environment.set_string_option("DATABASE_URL", Some("postgres://localhost/myapp"));

    // Build the container
    let container = Container::builder()
        .environment(environment)
        .prefer::<Arc<PostgresDatabase>, Arc<dyn DatabaseProtocol>>()
        .provider(DatabaseProvider)
        .build()?;

    tracing::info!("✅ Container built successfully!");

    // Shut down on every path, including errors
    let result = run(&container);
    container.shutdown();
    result?;

    println!("\n🎉 Everything works!");
    Ok(())
}

fn run(container: &Container) -> Result<()> {
    println!("{container:?}");
    println!("{}", container.services());

    let service: UserService = container.make()?;
    println!("👤 {}", service.get_user(42));

    // === Switch environments: singletons are rebuilt from the new options ===
    let mut testing = Environment::testing();
    testing.set_string_option("DATABASE_URL", Some("postgres://localhost/myapp_test"));
    testing.set_string_option("DB_PATH", Some("/tmp/test.sqlite"));
    container.switch_environment(testing);

    let service: UserService = container.make()?;
    println!("👤 {}", service.get_user(7));

    // The concrete registration is still reachable directly
    let sqlite: Arc<SqliteDatabase> = container.make()?;
    println!("🗄️  {}", sqlite.query("SELECT 1"));

    Ok(())
}
