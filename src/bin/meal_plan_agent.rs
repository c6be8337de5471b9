use clap::Parser;
use foodwell::adapters::agent::{format_profile_message, WEEKLY_PLAN_PROMPT};
use foodwell::core::meal_plan::build_plan;
use foodwell::core::plan_parser::parse_weekly_plan;
use foodwell::domain::model::User;
use foodwell::utils::{logger, validation::Validate};
use foodwell::{AppConfig, AppState, FoodError};

#[derive(Debug, Parser)]
#[command(name = "meal_plan_agent")]
#[command(about = "Ask the recipe agent for a weekly meal plan and print the parsed result")]
struct Args {
    #[arg(long, default_value = "foodwell.toml")]
    config: String,

    #[arg(long, help = "Load the profile of this user from the configured store")]
    user: Option<String>,

    #[arg(long, help = "Read the user profile from a JSON file instead of the store")]
    profile: Option<String>,

    #[arg(long, help = "Override the default weekly plan request")]
    message: Option<String>,

    #[arg(long, help = "Replace the user's stored meal plan with the result")]
    save: bool,

    #[arg(long, help = "Print the parsed plan as JSON")]
    json: bool,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

async fn load_profile(args: &Args, state: &AppState) -> foodwell::Result<User> {
    if let Some(path) = &args.profile {
        let content = tokio::fs::read_to_string(path).await?;
        return Ok(serde_json::from_str(&content)?);
    }

    let Some(user_id) = &args.user else {
        return Err(FoodError::BadRequest(
            "Either --user or --profile is required".to_string(),
        ));
    };
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| FoodError::NotFound(format!("User {} not found", user_id)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose, None);

    let config = AppConfig::from_file(&args.config)?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    let state = AppState::from_config(&config)?;

    let user = load_profile(&args, &state).await?;
    let request = args.message.as_deref().unwrap_or(WEEKLY_PLAN_PROMPT);
    let message = format_profile_message(request, &user)?;

    tracing::info!("🤖 Requesting weekly plan for {} ({})", user.name, user.id);
    let reply = state.agent.call_recipe_agent(&message, None).await?;

    let plan = match parse_weekly_plan(&reply.content) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("--- raw agent response ---\n{}", reply.content);
            std::process::exit(2);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        for day in &plan.days {
            println!("📅 {} ({:.0} kcal)", day.label, day.total_calories());
            for (slot, recipe) in &day.meals {
                println!(
                    "   {:<10} {} ({} min)",
                    slot, recipe.name, recipe.time_minutes
                );
            }
        }
        if let Some(run_id) = &reply.run_id {
            println!("🔁 Run id: {}", run_id);
        }
    }

    if args.save {
        let entries = build_plan(plan.to_entries())?;
        let count = entries.len();
        state.store.put_meal_plan(&user.id, entries).await?;
        println!("✅ Saved {} entries to the meal plan of {}", count, user.id);
    }

    Ok(())
}
