//! Storefront CLI
//!
//! Command-line front end over the client library: browse the catalog,
//! manage a login session, and run admin CRUD against the backend.

use std::io::Write;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use storefront_client::{
    fetch_categories, fetch_product, AdminController, ApiClient, CatalogController, ClientConfig,
    Confirmation, FileTokenStore, SessionManager,
};
use storefront_core::models::{Category, Product};
use storefront_core::query::{CatalogQuery, CategoryFilter, SortField, SortOrder, DEFAULT_LIMIT};
use storefront_core::validation::{CategoryFields, ProductFields};
use storefront_core::AdminResource;

#[derive(Parser)]
#[command(name = "storefront", version, about = "Product catalog client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend health
    Health,
    /// Create an account and log in
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Log in and persist the session token
    Login { email: String, password: String },
    /// Drop the session and the persisted token
    Logout,
    /// Show the current identity
    Whoami,
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List products with filters and sorting
    List {
        /// Text filter on name and description
        #[arg(long, default_value = "")]
        q: String,
        /// Category id, or "all"
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Sort field: created_at or price
        #[arg(long)]
        sort: Option<String>,
        /// Sort order: asc or desc
        #[arg(long)]
        order: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Show one product
    Show { id: Uuid },
    /// Create a product (admin)
    Create {
        #[arg(long)]
        category: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Update a product (admin); unset flags keep current values
    Update {
        id: Uuid,
        #[arg(long)]
        category: Option<Uuid>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a product (admin)
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List all categories
    List,
    /// Create a category (admin)
    Create { name: String },
    /// Rename a category (admin)
    Update { id: Uuid, name: String },
    /// Delete a category (admin)
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=info,storefront_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let api = ApiClient::with_timeout(&config.base_url, config.timeout);

    let store = match &config.token_file {
        Some(path) => FileTokenStore::at(path),
        None => FileTokenStore::open_default(),
    };
    let session = Arc::new(SessionManager::new(api.clone(), store));
    session.restore().await;

    match cli.command {
        Commands::Health => {
            let health = api.health().await?;
            println!("{} ({})", health.status, api.base_url());
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let user = session.register(&name, &email, &password).await?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
        }
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!(
                "Logged in as {} <{}> ({})",
                user.name,
                user.email,
                user.role.as_str()
            );
        }
        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }
        Commands::Whoami => match session.user() {
            Some(user) => println!(
                "{} <{}> ({})",
                user.name,
                user.email,
                user.role.as_str()
            ),
            None => println!("Not logged in"),
        },
        Commands::Products { command } => {
            run_product_command(command, &api, session).await?;
        }
        Commands::Categories { command } => {
            run_category_command(command, &api, session).await?;
        }
    }

    Ok(())
}

async fn run_product_command(
    command: ProductCommands,
    api: &ApiClient,
    session: Arc<SessionManager<FileTokenStore>>,
) -> Result<()> {
    match command {
        ProductCommands::List {
            q,
            category,
            min_price,
            max_price,
            sort,
            order,
            page,
            limit,
        } => {
            let mut query = CatalogQuery::new().with_limit(limit);
            query.set_text_filter(q);
            if category != "all" {
                let id = Uuid::parse_str(&category)
                    .map_err(|_| anyhow!("invalid category id: {}", category))?;
                query.set_category_filter(CategoryFilter::Only(id));
            }
            query.set_min_price(min_price);
            query.set_max_price(max_price);
            if let Some(sort) = sort {
                query.set_sort(
                    SortField::from_str(&sort).ok_or_else(|| anyhow!("unknown sort: {}", sort))?,
                );
            }
            if let Some(order) = order {
                query.set_order(
                    SortOrder::from_str(&order)
                        .ok_or_else(|| anyhow!("unknown order: {}", order))?,
                );
            }
            // Page last: filter and sort edits snap back to page 1.
            query.set_page(page);

            let catalog = CatalogController::with_query(api.clone(), query);
            catalog.refresh().await?;

            let state = catalog.state();
            println!(
                "{} product(s), page {}/{}",
                state.total,
                catalog.query().page(),
                catalog.page_count()
            );
            for product in &state.items {
                println!(
                    "{}  {:>10.2}  {}  [{}]",
                    product.id, product.price, product.name, product.category_name
                );
            }
        }
        ProductCommands::Show { id } => {
            let product = fetch_product(api, &id).await?;
            println!("{}", product.name);
            println!("  id:          {}", product.id);
            println!(
                "  category:    {} ({})",
                product.category_name, product.category_id
            );
            println!("  price:       {:.2}", product.price);
            println!("  description: {}", product.description);
            println!("  created:     {}", product.created_at);
            println!("  updated:     {}", product.updated_at);
        }
        ProductCommands::Create {
            category,
            name,
            price,
            description,
        } => {
            let admin: AdminController<Product> = AdminController::new(api.clone(), session);
            admin.open_create();
            admin.set_fields(ProductFields {
                category_id: Some(category),
                name,
                description,
                price,
            });
            admin.submit().await?;
            print_notice(admin.state().notice);
        }
        ProductCommands::Update {
            id,
            category,
            name,
            price,
            description,
        } => {
            let product = fetch_product(api, &id).await?;
            let admin: AdminController<Product> = AdminController::new(api.clone(), session);
            admin.open_edit(&product);

            let mut fields = product.to_fields();
            if let Some(category) = category {
                fields.category_id = Some(category);
            }
            if let Some(name) = name {
                fields.name = name;
            }
            if let Some(price) = price {
                fields.price = price;
            }
            if let Some(description) = description {
                fields.description = description;
            }
            admin.set_fields(fields);
            admin.submit().await?;
            print_notice(admin.state().notice);
        }
        ProductCommands::Delete { id, yes } => {
            let product = fetch_product(api, &id).await?;
            let admin: AdminController<Product> = AdminController::new(api.clone(), session);

            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                confirm(&AdminController::<Product>::remove_prompt(&product))?
            };
            if admin.remove(&product, confirmation).await? {
                print_notice(admin.state().notice);
            } else {
                println!("Aborted");
            }
        }
    }

    Ok(())
}

async fn run_category_command(
    command: CategoryCommands,
    api: &ApiClient,
    session: Arc<SessionManager<FileTokenStore>>,
) -> Result<()> {
    match command {
        CategoryCommands::List => {
            for category in fetch_categories(api).await? {
                println!("{}  {}", category.id, category.name);
            }
        }
        CategoryCommands::Create { name } => {
            let admin: AdminController<Category> = AdminController::new(api.clone(), session);
            admin.open_create();
            admin.set_fields(CategoryFields::new(name));
            admin.submit().await?;
            print_notice(admin.state().notice);
        }
        CategoryCommands::Update { id, name } => {
            let admin: AdminController<Category> = AdminController::new(api.clone(), session);
            admin.reload().await?;
            let category = find_category(&admin, id)?;

            admin.open_edit(&category);
            admin.set_fields(CategoryFields::new(name));
            admin.submit().await?;
            print_notice(admin.state().notice);
        }
        CategoryCommands::Delete { id, yes } => {
            let admin: AdminController<Category> = AdminController::new(api.clone(), session);
            admin.reload().await?;
            let category = find_category(&admin, id)?;

            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                confirm(&AdminController::<Category>::remove_prompt(&category))?
            };
            if admin.remove(&category, confirmation).await? {
                print_notice(admin.state().notice);
            } else {
                println!("Aborted");
            }
        }
    }

    Ok(())
}

fn find_category(admin: &AdminController<Category>, id: Uuid) -> Result<Category> {
    admin
        .state()
        .items
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| anyhow!("category not found"))
}

fn print_notice(notice: Option<String>) {
    if let Some(notice) = notice {
        println!("{}", notice);
    }
}

fn confirm(prompt: &str) -> Result<Confirmation> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(if answer == "y" || answer == "yes" {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    })
}
