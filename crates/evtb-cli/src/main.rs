//! EVTB CLI - terminal front end for the EV and battery marketplace.

use clap::{Parser, Subcommand};
use evtb_client::ApiError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// EVTB - buy and sell used EVs and batteries
#[derive(Parser, Debug)]
#[command(name = "evtb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Backend base URL (overrides config and EVTB_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Renew the stored session with its refresh token
    Refresh,

    /// Show the stored session
    Status,

    /// Browse listings
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        command: FavoriteCommands,
    },

    /// Manage orders
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Send a raw request and print the response
    Request {
        /// HTTP method
        method: String,
        /// Path relative to the API URL, or an absolute URL
        path: String,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ProductCommands {
    /// List listings
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        /// 1-based page
        #[arg(long)]
        page: Option<u32>,
        /// Page size
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one listing
    Show {
        /// Product ID
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum FavoriteCommands {
    /// List favorites
    List,
    /// Add a product to favorites
    Add {
        /// Product ID
        id: i64,
    },
    /// Remove a product from favorites
    Remove {
        /// Product ID
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum OrderCommands {
    /// List your orders
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("evtb={log_level},evtb_client={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match commands::client(cli.api_url.as_deref()) {
        Ok(client) => match cli.command {
            Commands::Login { email, password } => {
                commands::login(&client, &email, &password).await
            }
            Commands::Logout => commands::logout(&client),
            Commands::Refresh => commands::refresh(&client).await,
            Commands::Status => commands::status(&client),
            Commands::Products { command } => match command {
                ProductCommands::List {
                    search,
                    page,
                    page_size,
                } => commands::products_list(&client, search, page, page_size).await,
                ProductCommands::Show { id } => commands::products_show(&client, id).await,
            },
            Commands::Favorites { command } => match command {
                FavoriteCommands::List => commands::favorites_list(&client).await,
                FavoriteCommands::Add { id } => commands::favorites_add(&client, id).await,
                FavoriteCommands::Remove { id } => commands::favorites_remove(&client, id).await,
            },
            Commands::Orders { command } => match command {
                OrderCommands::List => commands::orders_list(&client).await,
            },
            Commands::Request { method, path, data } => {
                commands::request(&client, &method, &path, data.as_deref()).await
            }
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ApiError>() {
            Some(api) => {
                eprintln!("Error: {}", api.user_message());
                if api.is_unauthorized() {
                    eprintln!("Your session has ended. Run `evtb login` to sign in again.");
                }
            }
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_products_list() {
        let cli = Cli::try_parse_from([
            "evtb", "-vv", "products", "list", "--search", "pin", "--page-size", "5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Products {
                command: ProductCommands::List {
                    search, page_size, ..
                },
            } => {
                assert_eq!(search.as_deref(), Some("pin"));
                assert_eq!(page_size, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_request_with_global_api_url() {
        let cli = Cli::try_parse_from([
            "evtb",
            "request",
            "post",
            "/api/Favorite",
            "--data",
            r#"{"productId":1}"#,
            "--api-url",
            "http://localhost:5000",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000"));
        assert!(matches!(cli.command, Commands::Request { ref method, .. } if method == "post"));
    }
}
