//! Storefront CLI
//!
//! ```bash
//! # Active categories
//! storefront categories
//!
//! # Menu narrowed by category and search text
//! storefront menu --category pizzas --search calabresa
//!
//! # Walk through a cart without any backend
//! storefront --offline demo
//!
//! # Who the backend thinks you are
//! storefront whoami --email gerente@example.com --password secret
//! ```
//!
//! Online commands read `SUPABASE_URL` and `SUPABASE_ANON_KEY` (a `.env`
//! file is honoured). Set `RUST_LOG=debug` to see the queries.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use food_storefront::admin::AdminService;
use food_storefront::model::{CategoryId, ItemId};
use food_storefront::session::StorefrontSession;
use food_storefront::store::{
    AdminStore, CatalogStore, IdentityProvider, MemoryStore, StaticIdentity,
};
use food_storefront::Storefront;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Browse the menu and try the cart")]
struct Cli {
    /// Use the built-in demo menu instead of the hosted project
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active categories
    Categories,
    /// List active menu items
    Menu {
        /// Category id to narrow to
        #[arg(short, long)]
        category: Option<String>,

        /// Text matched against item names and descriptions
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Row counts for the back-office dashboard
    Dashboard,
    /// Add a few items, adjust quantities and check out
    Demo,
    /// Show the viewer, their profile and which back-office links they get
    Whoami {
        /// Sign in with this email first
        #[arg(long, requires = "password")]
        email: Option<String>,

        #[arg(long, requires = "email")]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.offline {
        let identity = StaticIdentity::anonymous();
        return dispatch(cli.command, MemoryStore::demo_menu(), &identity).await;
    }

    let storefront = Storefront::from_env()?;
    if let Commands::Whoami {
        email: Some(email),
        password: Some(password),
    } = &cli.command
    {
        storefront
            .auth()
            .sign_in_with_password(email, password)
            .await?;
    }
    dispatch(cli.command, storefront.store(), &storefront.identity()).await
}

async fn dispatch<S>(
    command: Commands,
    store: S,
    identity: &dyn IdentityProvider,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: CatalogStore + AdminStore,
{
    match command {
        Commands::Categories => {
            for category in store.list_categories().await? {
                println!("{:<20} {}", category.id, category.name);
            }
        }
        Commands::Menu { category, search } => {
            let mut session = StorefrontSession::new();
            session.select_category(category.map(CategoryId::from));
            session.set_search(search.unwrap_or_default());
            session.refresh(&store).await;
            for item in session.visible_items() {
                println!("{:<24} {:>8}  {}", item.name, item.price, item.id);
            }
        }
        Commands::Dashboard => {
            let counts = AdminService::new(store).dashboard().await?;
            println!("categories: {}", counts.categories);
            println!("items:      {}", counts.items);
            println!("users:      {}", counts.users);
        }
        Commands::Demo => demo(&store).await,
        Commands::Whoami { .. } => whoami(identity).await?,
    }
    Ok(())
}

async fn demo(store: &dyn CatalogStore) {
    let mut session = StorefrontSession::new();
    session.load_categories(store).await;
    session.refresh(store).await;

    let picks: Vec<ItemId> = session
        .visible_items()
        .iter()
        .take(2)
        .map(|item| item.id.clone())
        .collect();
    let Some(first) = picks.first() else {
        println!("The menu is empty.");
        return;
    };

    for id in picks.iter().chain(std::iter::once(first)) {
        session.add_visible_item(id);
    }
    session.open_cart();

    for notice in session.drain_notices() {
        println!("* {}", notice);
    }
    print_cart(&session);

    session.update_quantity(first, 3);
    println!("Quantity of the first line set to 3");
    print_cart(&session);

    session.checkout();
    for notice in session.drain_notices() {
        println!("* {}", notice);
    }
    print_cart(&session);
}

async fn whoami(identity: &dyn IdentityProvider) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = StorefrontSession::new();
    session.load_viewer(identity).await?;

    let Some(viewer) = session.viewer() else {
        println!("Not signed in.");
        return Ok(());
    };
    let roles: Vec<String> = viewer.roles.iter().map(ToString::to_string).collect();
    println!("user:      {}", viewer.id);
    println!("roles:     {}", roles.join(", "));
    if let Some(profile) = session.profile() {
        println!("name:      {} <{}>", profile.name, profile.email);
    }
    println!("admin:     {}", session.shows_admin_entry());
    println!("customers: {}", session.shows_customer_directory());
    Ok(())
}

fn print_cart(session: &StorefrontSession) {
    let cart = session.cart();
    for line in cart.lines() {
        println!(
            "  {:>3} x {:<24} {:>8}",
            line.quantity,
            line.name,
            line.subtotal()
        );
    }
    println!("  {} item(s), total {}", cart.item_count(), cart.total());
}
