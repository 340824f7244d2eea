use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use lexiladder_backend::catalog::ContentCatalog;
use lexiladder_backend::engine::{EngineConfig, ProgressEngine};
use lexiladder_backend::routes::build_router;
use lexiladder_backend::state::AppState;
use lexiladder_backend::store::Store;

use super::fixtures::write_catalog;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

pub async fn spawn_with_config(config: EngineConfig) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let catalog_dir = temp_dir.path().join("catalog");
    write_catalog(&catalog_dir);
    let sled_path = temp_dir.path().join("lexiladder-test.sled");

    let catalog = ContentCatalog::load_dir(Path::new(&catalog_dir)).expect("load catalog");
    let store = Arc::new(Store::open(&sled_path.to_string_lossy()).expect("open store"));
    store.run_migrations().expect("run migrations");

    let engine = Arc::new(ProgressEngine::new(config, Arc::new(catalog), store.clone()));
    let state = AppState::new(store, engine);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_config(EngineConfig::default()).await
}
