//! The process-wide model barrier. Kept in its own test binary so no other
//! test observes the global.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use quarto_yaml_validation::{ModelError, ResourceBundle, SchemaModel};

static LOADS: AtomicUsize = AtomicUsize::new(0);

fn load() -> Result<SchemaModel, ModelError> {
    LOADS.fetch_add(1, Ordering::SeqCst);
    let bundle = ResourceBundle::from_text("definitions:\n  - id: flag\n    schema: boolean\n", None)?;
    Ok(SchemaModel::from_bundle(bundle)?)
}

#[test]
fn model_loads_once_and_is_shared() {
    assert!(matches!(SchemaModel::get(), Err(ModelError::NotInitialized)));

    // a failing loader leaves the barrier open
    let failed = SchemaModel::ensure_loaded(|| Err(ModelError::Load("offline".into())));
    assert!(matches!(failed, Err(ModelError::Load(_))));
    assert!(SchemaModel::get().is_err());

    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| SchemaModel::ensure_loaded(load).unwrap()))
        .collect();
    let models: Vec<Arc<SchemaModel>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    let global = SchemaModel::get().unwrap();
    assert!(Arc::ptr_eq(&global, &models[0]));
    assert!(global.ref_schema("flag").is_ok());
}
