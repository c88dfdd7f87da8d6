//! Built-in cycling tools

pub mod climb_articles;
pub mod extract;
pub mod rentals;
mod serpapi;
pub mod strava;
pub mod weather;

pub use climb_articles::{ClimbArticle, ClimbArticlesTool, ClimbArticlesToolFactory};
pub use extract::{ExtractClimbsTool, ExtractClimbsToolFactory};
pub use rentals::{BikeRentalsTool, BikeRentalsToolFactory, RentalShop};
pub use strava::{StravaRoute, StravaRoutesTool, StravaRoutesToolFactory};
pub use weather::{
    ForecastDay, WeatherClient, WeatherForecastTool, WeatherForecastToolFactory, WeatherNowTool,
    WeatherNowToolFactory, WeatherReport,
};
