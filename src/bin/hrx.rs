// hrx/src/bin/hrx.rs

use actix_web::{App, HttpServer};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hrx::{
    backend::refresh_permissions,
    catalog::{default_menu, default_registry},
    configs::initializer::load_session_key,
    configure_hrx_services, get_hrx_session_middleware, hrx_initialize, setup_hrx_logging,
    filter_menu, filter_menu_by_role, Action, Decision, Directory, HrxConfig, MenuConfig,
    MenuSection, ModuleRegistry, PermissionStore,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hrx")]
#[command(about = "HRX permission tooling for the HR administration console")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce a bcrypt hash for a directory entry
    HashPassword {
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
        /// bcrypt cost
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },
    /// Answer whether a directory user may perform an action on a module
    Check {
        #[arg(long, env = "HRX_DIRECTORY")]
        directory: PathBuf,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        module: String,
        #[arg(short, long, default_value = "read")]
        action: String,
        #[arg(long, env = "HRX_ADMIN_ROLE_ID", default_value_t = 1)]
        admin_role_id: i64,
    },
    /// Print the navigation a directory user would see
    Menu {
        #[arg(long, env = "HRX_DIRECTORY")]
        directory: PathBuf,
        #[arg(short, long)]
        email: String,
        /// Menu definition (built-in menu when omitted)
        #[arg(long, env = "HRX_MENU")]
        menu: Option<PathBuf>,
        /// Filter by role ID list instead of permissions
        #[arg(long)]
        by_role: bool,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long, env = "HRX_ADMIN_ROLE_ID", default_value_t = 1)]
        admin_role_id: i64,
    },
    /// Validate a menu definition against the module registry
    ValidateMenu {
        #[arg(long)]
        menu: PathBuf,
    },
    /// Run the web console
    Serve {
        #[arg(long, env = "HRX_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password, cost } => hash_password(password, cost),
        Commands::Check { directory, email, module, action, admin_role_id } => {
            check(&directory, &email, &module, &action, admin_role_id).await
        }
        Commands::Menu { directory, email, menu, by_role, format, admin_role_id } => {
            print_menu(&directory, &email, menu.as_deref(), by_role, format, admin_role_id).await
        }
        Commands::ValidateMenu { menu } => validate_menu(&menu),
        Commands::Serve { bind } => serve(bind).await,
    }
}

fn hash_password(password: Option<String>, cost: u32) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("Password: ")?;
            let second = rpassword::prompt_password("Confirm password: ")?;
            if first != second {
                return Err(anyhow!("Passwords do not match"));
            }
            first
        }
    };
    if password.len() < 8 {
        return Err(anyhow!("Password must be at least 8 characters long"));
    }
    println!("{}", bcrypt::hash(password, cost)?);
    Ok(())
}

async fn signed_in_store(
    directory: &Directory,
    email: &str,
    admin_role_id: i64,
) -> Result<PermissionStore> {
    let user = directory
        .find_by_email(email)
        .ok_or_else(|| anyhow!("No user with email {}", email))?;
    let store = PermissionStore::new(admin_role_id);
    store.login(user.to_principal())?;
    refresh_permissions(&store, directory).await?;
    Ok(store)
}

fn load_directory(path: &Path, registry: &ModuleRegistry) -> Result<Directory> {
    Directory::from_path(path, registry)
        .with_context(|| format!("loading directory {}", path.display()))
}

async fn check(
    directory: &Path,
    email: &str,
    module: &str,
    action: &str,
    admin_role_id: i64,
) -> Result<()> {
    let registry = default_registry()?;
    let directory = load_directory(directory, &registry)?;
    let store = signed_in_store(&directory, email, admin_role_id).await?;

    let action: Action = action.parse()?;
    let decision = store.check(module, action);
    println!("{} {}:{} -> {}", email, module, action, decision.as_str());
    if decision != Decision::Allowed {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_menu(
    directory: &Path,
    email: &str,
    menu: Option<&Path>,
    by_role: bool,
    format: OutputFormat,
    admin_role_id: i64,
) -> Result<()> {
    let registry = default_registry()?;
    let directory = load_directory(directory, &registry)?;
    let menu = match menu {
        Some(path) => MenuConfig::from_path(path, &registry)?,
        None => default_menu(&registry)?,
    };
    let store = signed_in_store(&directory, email, admin_role_id).await?;

    let sections: Vec<MenuSection> = if by_role {
        let principal = store.principal();
        filter_menu_by_role(menu.entries(), principal.as_ref(), admin_role_id)
    } else {
        filter_menu(menu.entries(), &store)
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sections)?),
        OutputFormat::Text => {
            for section in &sections {
                println!("{}", section.heading.title);
                for item in &section.items {
                    println!("  - {:<24} {}", item.title, item.path);
                }
            }
        }
    }
    Ok(())
}

fn validate_menu(path: &Path) -> Result<()> {
    let registry = default_registry()?;
    let menu = MenuConfig::from_path(path, &registry)?;
    println!("✅ {} entries OK", menu.entries().len());
    Ok(())
}

async fn serve(bind: String) -> Result<()> {
    let config = HrxConfig::from_env()?;
    setup_hrx_logging(&config);
    hrx::utils::auth::validate_session_config(&config).map_err(anyhow::Error::msg)?;
    let state = hrx_initialize(&config)?;
    let secret_key = load_session_key(&config)?;

    log::info!("🚀 HRX listening on http://{}/hrx", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(get_hrx_session_middleware(&config, secret_key.clone()))
            .configure(configure_hrx_services(config.clone(), state.clone()))
    })
    .bind(&bind)?
    .run()
    .await?;
    Ok(())
}
