pub mod api;
pub mod config;
pub mod db;
pub mod search;
pub mod utils;

pub use db::DbPool;

use config::Config;
use search::RecipeClient;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub recipes: RecipeClient,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let recipes = RecipeClient::new(&config.recipe_api);
        Self {
            config,
            db,
            recipes,
        }
    }
}
