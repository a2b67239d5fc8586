use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;

mod domain {
    pub mod entities {
        pub mod columns;
        pub mod filter;
        pub mod region;
        pub mod table;
    }
}

mod usecase {
    pub mod ports {
        pub mod source;
    }
    pub mod services {
        pub mod filter_service;
        pub mod inventory_service;
        pub mod pivot_service;
        pub mod year_filter;
    }
}

mod infra {
    pub mod export {
        pub mod report;
    }
    pub mod import {
        pub mod csv;
        pub mod reader;
        pub mod xlsx;
    }
    pub mod sqlite {
        pub mod queries;
        pub mod repo;
        pub mod schema;
    }
}

mod platform {
    pub mod desktop {
        pub mod blocking;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
    }
}

#[cfg(test)]
mod tests;

use crate::app::App;
use crate::config::{default_webview_data_dir, AppConfig};

fn main() {
    let log_filter = AppConfig::from_env()
        .map(|config| config.log_filter)
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&log_filter);

    let webview_data_dir = match default_webview_data_dir() {
        Ok(dir) => dir,
        Err(err) => {
            error!("failed to prepare webview data directory: {err:#}");
            std::process::exit(1);
        }
    };
    info!(data_dir = %webview_data_dir.display(), "starting");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new().with_title("Existencias por Región"),
                )
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}

fn init_tracing(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if (value.fract()).abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{value:.6}");
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
        text
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// `part` as a share of `total`, rounded to two decimals, e.g. `"62.5%"`.
/// A zero total yields `"0%"`.
fn format_percent(part: f64, total: f64) -> String {
    let percent = (safe_div(part, total) * 100.0 * 100.0).round() / 100.0;
    format!("{}%", format_f64(percent))
}
