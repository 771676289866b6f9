//! Requests through a running worker.

use std::sync::Arc;
use std::time::Duration;

use quarto_source_map::Position;
use quarto_yaml_intelligence::{
    FileType, GET_LINT, ProtocolError, Request, Worker, WorkerConfig, WorkerHandle,
    YamlIntelligenceContext,
};
use quarto_yaml_validation::{ResourceBundle, SchemaModel};

const BUNDLE: &str = r#"
definitions:
  - id: front-matter
    schema:
      object:
        properties:
          title: string
          toc: boolean
          theme:
            enum: [cosmo, darkly]
        closed: true
  - id: cell-options
    schema:
      object:
        properties:
          echo: boolean
          fig-width: number
          label:
            string:
              pattern: "^[a-z][a-z0-9-]*$"
"#;

fn worker() -> WorkerHandle {
    let model = SchemaModel::from_bundle(ResourceBundle::from_text(BUNDLE, None).unwrap()).unwrap();
    Worker::spawn_with_model(WorkerConfig::default(), Arc::new(model))
}

#[tokio::test]
async fn lint_front_matter() {
    let handle = worker();
    let ctx = YamlIntelligenceContext::new("---\ntitle: Report\ntheme: cosmos\n---\n\nText\n", FileType::Markdown)
        .with_path("report.qmd");
    let diagnostics = handle.get_lint(&ctx).await.unwrap();
    assert_eq!(diagnostics.len(), 1);
    let d = &diagnostics[0];
    assert_eq!(d.code.as_deref(), Some("Q-1-12"));
    assert_eq!(d.start, Position::new(2, 7));
    assert_eq!(d.end, Position::new(2, 13));
    assert_eq!(d.error.info.get("did-you-mean").map(String::as_str), Some("Did you mean \"cosmo\"?"));
}

#[tokio::test]
async fn lint_cell_options() {
    let handle = worker();
    let mut ctx = YamlIntelligenceContext::new(
        "#| echo: maybe\n#| label: Fig 1\nprint(1)\n",
        FileType::Script,
    );
    ctx.language = Some("python".to_string());
    let diagnostics = handle.get_lint(&ctx).await.unwrap();
    let starts: Vec<Position> = diagnostics.iter().map(|d| d.start).collect();
    assert_eq!(starts, vec![Position::new(0, 9), Position::new(1, 10)]);
    let codes: Vec<_> = diagnostics.iter().map(|d| d.code.as_deref()).collect();
    assert_eq!(codes, vec![Some("Q-1-11"), Some("Q-1-14")]);
}

#[tokio::test]
async fn completions_through_worker() {
    let handle = worker();
    let ctx = YamlIntelligenceContext::new("---\ntitle: x\nth\n---\n", FileType::Markdown).with_position(2, 2);
    let result = handle.get_completions(&ctx).await.unwrap();
    let labels: Vec<_> = result.completions.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["theme"]);
    assert_eq!(result.token, "th");
}

#[tokio::test]
async fn protocol_errors_keep_the_worker_alive() {
    let handle = worker();
    let bad = Request {
        id: 99,
        method: "getHover".to_string(),
        args: serde_json::Value::Null,
    };
    let response = handle.call(bad).await.unwrap();
    assert_eq!(response.id, 99);
    assert_eq!(
        response.into_result(),
        Err(ProtocolError::UnknownMethod("getHover".to_string()))
    );

    let malformed = Request {
        id: 100,
        method: GET_LINT.to_string(),
        args: serde_json::json!({"filetype": "docx"}),
    };
    assert!(matches!(
        handle.call(malformed).await.unwrap().into_result(),
        Err(ProtocolError::MalformedRequest(_))
    ));

    let ctx = YamlIntelligenceContext::new("---\ntoc: true\n---\n", FileType::Markdown);
    assert!(handle.get_lint(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn clones_share_one_worker() {
    let handle = worker();
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move {
                let code = format!("---\ntoc: {}\n---\n", if i % 2 == 0 { "yes" } else { "true" });
                let ctx = YamlIntelligenceContext::new(code, FileType::Markdown);
                handle.get_lint(&ctx).await.map(|d| d.len())
            })
        })
        .collect();
    let mut counts = Vec::new();
    for task in tasks {
        counts.push(task.await.unwrap().unwrap());
    }
    assert_eq!(counts, vec![1, 0, 1, 0, 1, 0, 1, 0]);
}

#[tokio::test]
async fn schema_missing_from_model_reports_nothing() {
    let model = SchemaModel::from_bundle(ResourceBundle::from_text(BUNDLE, None).unwrap()).unwrap();
    let handle = Worker::spawn_with_model(
        WorkerConfig {
            queue_capacity: 1,
            ..WorkerConfig::default()
        },
        Arc::new(model),
    )
    .with_timeout(Duration::from_secs(5));
    let ctx = YamlIntelligenceContext::new("toc: 1
", FileType::Yaml).with_position(0, 5);
    assert!(handle.get_lint(&ctx).await.unwrap().is_empty());
    assert!(handle.get_completions(&ctx).await.unwrap().completions.is_empty());
}
