//!
//! enplace CLI
//! -----------
//! Small operator tool for poking a Chef en Place backend through the client
//! library. With a vault directory configured the login survives between
//! invocations, so `login` once and then query freely.

use std::env;

use anyhow::{anyhow, Result};

use enplace::{ApiClient, ClientConfig, RecipeFilter};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api URL] [--vault DIR] <command> [args]\n\nCommands:\n  login <email> <password>     authenticate and store the session\n  register <name> <email> <password>   create a head-chef account\n  whoami                       show the logged-in user\n  recipes [panel-id]           list recipes, optionally one panel's\n  recipe <id>                  show one recipe\n  panels                       list panels\n  plateups [folder-id]         list plate-up standards\n  folders                      list plate-up folders\n  notifications                list notifications\n  unread                       show unread notification count\n  team                         list team members\n  pending                      list pending chef requests\n  restaurant                   show my restaurant\n  logout                       clear the session\n\nFlags:\n  --api URL     API root (env: ENPLACE_API_URL, default http://localhost:5000/api)\n  --vault DIR   session vault directory (env: ENPLACE_VAULT_DIR)\n  -h, --help    show this help\n"
    );
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            let value = args.remove(i + 1);
            args.remove(i);
            return Some(value);
        }
        i += 1;
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    if args.iter().any(|a| a == "--help" || a == "-h") || args.is_empty() {
        print_usage(&program);
        return Ok(());
    }

    let mut config = ClientConfig::from_env();
    if let Some(api) = take_flag(&mut args, "--api") {
        config.base_url = ClientConfig::new(&api)?.base_url;
    }
    if let Some(vault) = take_flag(&mut args, "--vault") {
        config = config.with_vault_dir(vault);
    }

    if args.is_empty() {
        print_usage(&program);
        return Err(anyhow!("missing command"));
    }

    let client = ApiClient::new(&config)?;
    let command = args.remove(0);

    match command.as_str() {
        "login" => {
            let (email, password) = two_args(&args, "login <email> <password>")?;
            let auth = client.login(&email, &password).await?;
            println!("logged in as {} <{}> ({})", auth.user.name, auth.user.email, auth.user.role);
        }
        "register" => {
            if args.len() < 3 {
                return Err(anyhow!("usage: register <name> <email> <password>"));
            }
            let account = enplace::NewAccount {
                name: args[0].clone(),
                email: args[1].clone(),
                password: args[2].clone(),
                role: None,
            };
            let auth = client.register(&account).await?;
            println!("registered {} <{}>", auth.user.name, auth.user.email);
        }
        "whoami" => match client.session().user() {
            Some(user) => println!("{} <{}> role={} status={}", user.name, user.email, user.role, user.status),
            None => println!("not logged in"),
        },
        "recipes" => {
            let filter = match args.first() {
                Some(panel) => RecipeFilter::for_panel(panel.clone()),
                None => RecipeFilter::default(),
            };
            for recipe in client.recipes(&filter).await? {
                println!("{}  {}  panel={}", recipe.id, recipe.title, recipe.panel);
            }
        }
        "recipe" => {
            let id = one_arg(&args, "recipe <id>")?;
            let recipe = client.recipe(&id).await?;
            println!("{}  {}", recipe.id, recipe.title);
            for ingredient in &recipe.ingredients {
                println!("  - {} {}", ingredient.quantity.as_deref().unwrap_or(""), ingredient.name);
            }
            println!("{}", recipe.method);
        }
        "panels" => {
            for panel in client.panels().await? {
                println!("{}  {}  order={} recipes={}", panel.id, panel.name, panel.order, panel.recipe_count);
            }
        }
        "plateups" => {
            let plateups = match args.first() {
                Some(folder) => client.plateups_in_folder(folder).await?,
                None => client.plateups().await?,
            };
            for plateup in plateups {
                println!("{}  {}", plateup.id, plateup.name);
            }
        }
        "folders" => {
            for folder in client.plateup_folders().await? {
                println!("{}  {}", folder.id, folder.name);
            }
        }
        "notifications" => {
            for notification in client.notifications().await? {
                let marker = if notification.read { " " } else { "*" };
                println!("{}{}  [{}] {}", marker, notification.id, notification.kind, notification.title);
            }
        }
        "unread" => {
            println!("{}", client.unread_count().await?);
        }
        "team" => {
            for member in client.team_members().await? {
                println!("{}  {} <{}> role={} status={}", member.id, member.name, member.email, member.role, member.status);
            }
        }
        "pending" => {
            for request in client.pending_requests().await? {
                println!("{}  {}  {}", request.id, request.name, request.status);
            }
        }
        "restaurant" => {
            let restaurant = client.my_restaurant().await?;
            println!("{}  org={} type={} status={}", restaurant.name, restaurant.organization_id, restaurant.kind, restaurant.status);
        }
        "logout" => {
            client.logout().await?;
            println!("logged out");
        }
        other => {
            print_usage(&program);
            return Err(anyhow!("unknown command: {}", other));
        }
    }

    Ok(())
}

fn one_arg(args: &[String], usage: &str) -> Result<String> {
    args.first().cloned().ok_or_else(|| anyhow!("usage: {}", usage))
}

fn two_args(args: &[String], usage: &str) -> Result<(String, String)> {
    match (args.first(), args.get(1)) {
        (Some(a), Some(b)) => Ok((a.clone(), b.clone())),
        _ => Err(anyhow!("usage: {}", usage)),
    }
}
