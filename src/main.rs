use std::process::ExitCode;
use std::rc::Rc;

use player_runtime::assets::{DecodedAsset, DispatchOutcome};
use player_runtime::bootstrap::{EnvironmentInfo, LibraryFlags};
use player_runtime::config::PlayerConfig;
use player_runtime::core::logging;
use player_runtime::display::HeadlessSurface;
use player_runtime::resources::FileSystemFetcher;
use player_runtime::scripting::QuickJsExecutor;
use player_runtime::Player;

/// 用法：`player_runtime [url] [root-scene.json]`
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let mut config = PlayerConfig::load_or_default();
    config.apply_env_overrides();
    logging::init(&config.logging);
    if let Err(e) = config.validate() {
        tracing::error!(target: "player", "Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "file:///movie.swf".to_string());
    let scene_path = args.next();

    let executor = match QuickJsExecutor::new() {
        Ok(executor) => executor,
        Err(e) => {
            tracing::error!(target: "player", "Failed to start script engine: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = Rc::new(FileSystemFetcher::new(config.bootstrap.asset_root.clone()));
    let mut player = Player::new(fetcher, config.bootstrap.clone(), Box::new(executor));

    let env = EnvironmentInfo {
        url,
        content_version: 10,
        surface: Rc::new(HeadlessSurface::new(550, 400)),
    };
    match player
        .begin_bootstrap(env, LibraryFlags::BUILTIN | LibraryFlags::PLAYERGLOBAL)
        .await
    {
        Ok(Some(_)) => tracing::info!(target: "player", "Execution domain ready"),
        Ok(None) => {
            tracing::warn!(target: "player", "Bootstrap finished without a content factory");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!(target: "player", "Bootstrap failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = scene_path {
        let asset = match tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<DecodedAsset>(&s).map_err(|e| e.to_string()))
        {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!(target: "player", "Failed to read {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        };
        match player.dispatch(asset, true) {
            Ok(DispatchOutcome::RootGrafted { report, .. }) if !report.is_clean() => {
                tracing::warn!(target: "player", "{} constructors failed", report.failures.len());
            }
            Ok(outcome) => tracing::info!(target: "player", "Dispatched {}: {:?}", path, outcome),
            Err(e) => {
                tracing::error!(target: "player", "{}", e);
                return ExitCode::FAILURE;
            }
        }
        if let Some(tick) = player.on_frame_tick() {
            tracing::info!(
                target: "player",
                "Frame {}: {} started, {} advanced, {} events",
                tick.frame,
                tick.started.len(),
                tick.advanced,
                tick.events.len()
            );
        }
    }

    ExitCode::SUCCESS
}
