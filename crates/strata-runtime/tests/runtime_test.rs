use std::sync::Arc;

use serde_json::{Value, json};
use strata_config::{ExecutionMode, FailurePolicy};
use strata_frame::Frame;
use strata_runtime::{NodeStatus, RuntimeConfig, RuntimeError, WorkflowRuntime};
use strata_transform::{StandardEngine, StandardRegistry};
use strata_workflow::Workflow;

fn runtime_with(definition: Value, config: RuntimeConfig) -> WorkflowRuntime {
  let workflow = Workflow::build(serde_json::from_value(definition).unwrap()).unwrap();
  WorkflowRuntime::new(
    workflow,
    Arc::new(StandardRegistry::with_builtins()),
    Arc::new(StandardEngine),
    config,
  )
}

fn runtime(definition: Value) -> WorkflowRuntime {
  runtime_with(definition, RuntimeConfig::default())
}

fn frame(records: Value) -> Frame {
  Frame::from_value(records).unwrap()
}

fn numbers(runtime: &WorkflowRuntime, table: &str, column: &str) -> Vec<Option<f64>> {
  runtime
    .table_data(table)
    .unwrap()
    .column(column)
    .unwrap()
    .iter()
    .map(Value::as_f64)
    .collect()
}

fn link_aggregate() -> Value {
  json!({
    "id": "My workflow",
    "tables": [
      {
        "id": "Facts",
        "columns": [
          {"id": "Group Link", "operation": "link", "keys": ["A"], "linked_table": "Groups", "linked_keys": ["A"]}
        ]
      },
      {
        "id": "Groups",
        "operation": "noop",
        "columns": [
          {
            "id": "Aggregate",
            "operation": "aggregate",
            "fact_table": "Facts",
            "group_column": "Group Link",
            "function": "std:sum",
            "inputs": ["M"],
            "fillna_value": 0.0
          }
        ]
      }
    ]
  })
}

fn seed_link_aggregate(runtime: &WorkflowRuntime) {
  runtime
    .set_table_data(
      "Facts",
      frame(json!([
        {"A": "a", "M": 1.0},
        {"A": "a", "M": 2.0},
        {"A": "b", "M": 3.0},
        {"A": "b", "M": 4.0}
      ])),
    )
    .unwrap();
  runtime
    .set_table_data("Groups", frame(json!([{"A": "a"}, {"A": "b"}, {"A": "c"}])))
    .unwrap();
}

#[tokio::test]
async fn test_calculate_float() {
  let runtime = runtime(json!({
    "tables": [{"id": "T", "columns": [
      {"id": "float(A)", "function": "std:float", "inputs": "A"}
    ]}]
  }));
  runtime
    .set_table_data("T", frame(json!([{"A": "1"}, {"A": "2.0"}, {"A": 3}])))
    .unwrap();

  let result = runtime.execute_workflow().wait().await.unwrap();
  assert!(result.is_success());

  let data = runtime.table_data("T").unwrap();
  assert_eq!(
    data.column("float(A)").unwrap(),
    &[json!(1.0), json!(2.0), json!(3.0)]
  );
}

#[tokio::test]
async fn test_roll_window() {
  let runtime = runtime(json!({
    "tables": [{"id": "T", "columns": [
      {"id": "sum(A)", "function": "std:sum", "window": "2", "inputs": "A"}
    ]}]
  }));
  runtime
    .set_table_data("T", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(numbers(&runtime, "T", "sum(A)"), vec![None, Some(3.0), Some(5.0)]);
}

#[tokio::test]
async fn test_family_of_windows() {
  let runtime = runtime(json!({
    "tables": [{"id": "My table", "columns": [{
      "id": "sum(A)",
      "function": "std:sum",
      "inputs": ["A"],
      "extensions": [{"scope": "2"}, {"scope": "3", "outputs": ["sum(A)_win3"]}]
    }]}]
  }));
  runtime
    .set_table_data("My table", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}, {"A": 4}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let window2 = numbers(&runtime, "My table", "sum(A)_0");
  let window3 = numbers(&runtime, "My table", "sum(A)_win3");
  assert_eq!(window2[2..], [Some(5.0), Some(7.0)]);
  assert_eq!(window3[2..], [Some(6.0), Some(9.0)]);
}

#[tokio::test]
async fn test_family_of_functions() {
  let runtime = runtime(json!({
    "tables": [{"id": "My table", "columns": [{
      "id": "A",
      "inputs": ["A"],
      "scope": "2",
      "extensions": [
        {"function": "std:sum", "outputs": "A_sum"},
        {"function": "std:mean", "outputs": "A_mean"}
      ]
    }]}]
  }));
  runtime
    .set_table_data("My table", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(numbers(&runtime, "My table", "A_sum"), vec![None, Some(3.0), Some(5.0)]);
  assert_eq!(numbers(&runtime, "My table", "A_mean"), vec![None, Some(1.5), Some(2.5)]);
}

#[tokio::test]
async fn test_shift_whole_column() {
  let runtime = runtime(json!({
    "tables": [{"id": "My table", "columns": [{
      "id": "My Column",
      "function": "std:shift",
      "scope": "all",
      "inputs": ["A"],
      "outputs": ["next(A)"],
      "model": {"periods": -1}
    }]}]
  }));
  runtime
    .set_table_data("My table", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(
    numbers(&runtime, "My table", "next(A)"),
    vec![Some(2.0), Some(3.0), None]
  );
}

#[tokio::test]
async fn test_extend_copies_base_data() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Base Table", "operation": "noop", "columns": [
        {"id": "B", "operation": "calculate", "function": "std:add", "inputs": ["A"], "model": {"value": 1}}
      ]},
      {"id": "Extended Table", "columns": [
        {"id": "C", "operation": "calculate", "function": "std:add", "inputs": ["B"], "model": {"value": 1}}
      ]}
    ]
  }));
  runtime
    .set_table_data("Base Table", frame(json!([{"A": 1.0}, {"A": 2.0}, {"A": 3.0}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let extended = runtime.table_data("Extended Table").unwrap();
  assert_eq!(extended.row_count(), 3);
  assert_eq!(extended.column_count(), 3);
  assert_eq!(
    numbers(&runtime, "Extended Table", "C"),
    vec![Some(3.0), Some(4.0), Some(5.0)]
  );
  assert!(!runtime.table_data("Base Table").unwrap().contains("C"));
}

#[tokio::test]
async fn test_seeded_extend_table_keeps_its_data() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Base", "operation": "noop"},
      {"id": "Extended", "columns": [
        {"id": "C", "function": "std:add", "inputs": ["A"], "model": {"value": 1}}
      ]}
    ]
  }));
  runtime.set_table_data("Base", frame(json!([{"A": 1.0}, {"A": 2.0}]))).unwrap();
  runtime.set_table_data("Extended", frame(json!([{"A": 10.0}]))).unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(numbers(&runtime, "Extended", "C"), vec![Some(11.0)]);
}

#[tokio::test]
async fn test_link_positions() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Table 1", "columns": [
        {"id": "My Link", "operation": "link", "keys": ["A"], "linked_table": "Table 2", "linked_keys": ["B"]}
      ]},
      {"id": "Table 2", "operation": "noop"}
    ]
  }));
  runtime
    .set_table_data("Table 1", frame(json!([{"A": "a"}, {"A": "a"}, {"A": "b"}, {"A": "b"}])))
    .unwrap();
  runtime
    .set_table_data(
      "Table 2",
      frame(json!([{"B": "a", "C": 1}, {"B": "b", "C": 2}, {"B": "c", "C": 3}])),
    )
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let data = runtime.table_data("Table 1").unwrap();
  assert_eq!(data.column_count(), 2);
  assert_eq!(
    data.column("My Link").unwrap(),
    &[json!(0), json!(0), json!(1), json!(1)]
  );
}

#[tokio::test]
async fn test_link_without_match_is_null() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "T1", "columns": [
        {"id": "L", "operation": "link", "keys": ["A", "B"], "linked_table": "T2", "linked_keys": ["A", "B"]}
      ]},
      {"id": "T2", "operation": "noop"}
    ]
  }));
  runtime
    .set_table_data("T1", frame(json!([{"A": "a", "B": 1}, {"A": "a", "B": 2}, {"A": null, "B": 1}])))
    .unwrap();
  runtime
    .set_table_data("T2", frame(json!([{"A": "a", "B": 2}, {"A": "a", "B": 1}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(
    runtime.table_data("T1").unwrap().column("L").unwrap(),
    &[json!(1), json!(0), Value::Null]
  );
}

#[tokio::test]
async fn test_aggregate_fills_empty_groups() {
  let runtime = runtime(link_aggregate());
  seed_link_aggregate(&runtime);

  runtime.execute_workflow().wait().await.unwrap();
  let groups = runtime.table_data("Groups").unwrap();
  assert_eq!(groups.row_count(), 3);
  assert_eq!(groups.column_count(), 2);
  assert_eq!(
    numbers(&runtime, "Groups", "Aggregate"),
    vec![Some(3.0), Some(7.0), Some(0.0)]
  );
}

#[tokio::test]
async fn test_aggregate_group_size() {
  let mut definition = link_aggregate();
  let column = &mut definition["tables"][1]["columns"][0];
  column["function"] = Value::Null;
  column["inputs"] = json!([]);
  column["fillna_value"] = json!(0);

  let runtime = runtime(definition);
  seed_link_aggregate(&runtime);

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(
    runtime.table_data("Groups").unwrap().column("Aggregate").unwrap(),
    &[json!(2), json!(2), json!(0)]
  );
}

#[tokio::test]
async fn test_compose_reads_linked_column() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Table 1", "columns": [
        {"id": "Compose", "operation": "compose", "inputs": ["Link", "B"]},
        {"id": "Link", "operation": "link", "keys": ["A"], "linked_table": "Table 2", "linked_keys": ["A"]}
      ]},
      {"id": "Table 2", "operation": "noop"}
    ]
  }));
  runtime
    .set_table_data("Table 1", frame(json!([{"A": "a"}, {"A": "a"}, {"A": "b"}, {"A": "b"}])))
    .unwrap();
  runtime
    .set_table_data("Table 2", frame(json!([{"A": "a", "B": 1}, {"A": "b", "B": 2}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(
    runtime.table_data("Table 1").unwrap().column("Compose").unwrap(),
    &[json!(1), json!(1), json!(2), json!(2)]
  );
}

#[tokio::test]
async fn test_compose_chain() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "T1", "columns": [
        {"id": "Deep", "operation": "compose", "inputs": ["L1", "L2", "C"]},
        {"id": "L1", "operation": "link", "keys": "A", "linked_table": "T2", "linked_keys": "A"}
      ]},
      {"id": "T2", "operation": "noop", "columns": [
        {"id": "L2", "operation": "link", "keys": "B", "linked_table": "T3", "linked_keys": "B"}
      ]},
      {"id": "T3", "operation": "noop"}
    ]
  }));
  runtime.set_table_data("T1", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}]))).unwrap();
  runtime
    .set_table_data("T2", frame(json!([{"A": 2, "B": "y"}, {"A": 1, "B": "x"}])))
    .unwrap();
  runtime
    .set_table_data("T3", frame(json!([{"B": "x", "C": 10}, {"B": "y", "C": 20}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(
    runtime.table_data("T2").unwrap().column("L2::C").unwrap(),
    &[json!(20), json!(10)]
  );
  assert_eq!(
    runtime.table_data("T1").unwrap().column("Deep").unwrap(),
    &[json!(10), json!(20), Value::Null]
  );
}

#[tokio::test]
async fn test_compose_chain_reads_declared_intermediate() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "T1", "columns": [
        {"id": "Deep", "operation": "compose", "inputs": ["L1", "L2", "C"]},
        {"id": "L1", "operation": "link", "keys": "A", "linked_table": "T2", "linked_keys": "A"}
      ]},
      {"id": "T2", "operation": "noop", "columns": [
        {"id": "L2", "operation": "link", "keys": "B", "linked_table": "T3", "linked_keys": "B"},
        {"id": "Via", "operation": "compose", "inputs": ["L2", "C"]}
      ]},
      {"id": "T3", "operation": "noop"}
    ]
  }));
  runtime.set_table_data("T1", frame(json!([{"A": 1}, {"A": 2}, {"A": 3}]))).unwrap();
  runtime
    .set_table_data("T2", frame(json!([{"A": 2, "B": "y"}, {"A": 1, "B": "x"}])))
    .unwrap();
  runtime
    .set_table_data("T3", frame(json!([{"B": "x", "C": 10}, {"B": "y", "C": 20}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let t2 = runtime.table_data("T2").unwrap();
  assert_eq!(t2.column("Via").unwrap(), &[json!(20), json!(10)]);
  assert!(!t2.contains("L2::C"));
  assert_eq!(
    runtime.table_data("T1").unwrap().column("Deep").unwrap(),
    &[json!(10), json!(20), Value::Null]
  );
}

#[tokio::test]
async fn test_link_reads_filtered_linked_table() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Facts", "columns": [
        {"id": "Link", "operation": "link", "keys": "A", "linked_table": "Groups", "linked_keys": "A"},
        {"id": "Name", "operation": "compose", "inputs": ["Link", "N"]}
      ]},
      {
        "id": "Groups",
        "operation": "noop",
        "row_filter": {"function": "std:gt", "inputs": ["A"], "model": {"value": 1}}
      }
    ]
  }));
  runtime.set_table_data("Facts", frame(json!([{"A": 2}, {"A": 3}]))).unwrap();
  runtime
    .set_table_data(
      "Groups",
      frame(json!([{"A": 1, "N": "one"}, {"A": 2, "N": "two"}, {"A": 3, "N": "three"}])),
    )
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let facts = runtime.table_data("Facts").unwrap();
  assert_eq!(facts.column("Link").unwrap(), &[json!(0), json!(1)]);
  assert_eq!(facts.column("Name").unwrap(), &[json!("two"), json!("three")]);
  assert_eq!(runtime.table_data("Groups").unwrap().row_count(), 2);
}

#[tokio::test]
async fn test_project_distinct_rows() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Source"},
      {"id": "Destination", "operation": "project", "source_table": "Source", "inputs": ["A"], "outputs": ["B"]}
    ]
  }));
  runtime
    .set_table_data(
      "Source",
      frame(json!([
        {"A": "a", "M": 1.0},
        {"A": "a", "M": 2.0},
        {"A": "b", "M": 3.0},
        {"A": "b", "M": 4.0}
      ])),
    )
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let projected = runtime.table_data("Destination").unwrap();
  assert_eq!(projected.row_count(), 2);
  assert_eq!(projected.column_names(), &["B".to_string()]);
  assert_eq!(projected.column("B").unwrap(), &[json!("a"), json!("b")]);
}

#[tokio::test]
async fn test_product() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "X"},
      {"id": "Y", "operation": "noop"},
      {"id": "XY", "operation": "product", "inputs": ["X", "Y"]}
    ]
  }));
  runtime.set_table_data("X", frame(json!([{"x": 1}, {"x": 2}]))).unwrap();
  runtime
    .set_table_data("Y", frame(json!([{"y": "a"}, {"y": "b"}, {"y": "c"}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let product = runtime.table_data("XY").unwrap();
  assert_eq!(product.row_count(), 6);
  assert_eq!(product.row(3).unwrap(), vec![&json!(2), &json!("a")]);
}

#[tokio::test]
async fn test_join_table() {
  let runtime = runtime(json!({
    "tables": [
      {"id": "Main"},
      {"id": "Second", "operation": "noop"},
      {
        "id": "Merged",
        "function": "std:join",
        "inputs": ["Main", "Second"],
        "model": {"keys": ["A", "B"]},
        "columns": [{"id": "D", "function": "std:add", "inputs": ["C"], "model": {"value": 10}}]
      }
    ]
  }));
  runtime
    .set_table_data("Main", frame(json!([{"A": "a"}, {"A": "a"}, {"A": "b"}, {"A": "b"}])))
    .unwrap();
  runtime
    .set_table_data(
      "Second",
      frame(json!([{"B": "a", "C": 1}, {"B": "b", "C": 2}, {"B": "c", "C": 3}])),
    )
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let merged = runtime.table_data("Merged").unwrap();
  assert_eq!(
    merged.column_names(),
    &["A".to_string(), "C".to_string(), "D".to_string()]
  );
  assert_eq!(merged.column("D").unwrap(), &[json!(11), json!(11), json!(12), json!(12)]);
}

#[tokio::test]
async fn test_filter_rows_and_columns() {
  let runtime = runtime(json!({
    "tables": [{
      "id": "T",
      "row_filter": {"function": "std:gt", "inputs": ["B"], "model": {"value": 1}},
      "column_filter": {"exclude": ["Drop"]},
      "columns": [
        {"id": "B", "function": "std:add", "inputs": ["A"], "model": {"value": 0}},
        {"id": "Tmp", "function": "std:float", "inputs": ["A"], "exclude": true}
      ]
    }]
  }));
  runtime
    .set_table_data(
      "T",
      frame(json!([{"A": 1, "Drop": "x"}, {"A": 2, "Drop": "y"}, {"A": 3, "Drop": "z"}])),
    )
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  let data = runtime.table_data("T").unwrap();
  assert_eq!(data.column_names(), &["A".to_string(), "B".to_string()]);
  assert_eq!(data.column("B").unwrap(), &[json!(2), json!(3)]);
}

#[tokio::test]
async fn test_train_then_apply() {
  let runtime = runtime(json!({
    "tables": [{"id": "T", "columns": [{
      "id": "scaled",
      "function": "std:scale",
      "inputs": ["A"],
      "train": {"function": "std:fit_scale"}
    }]}]
  }));
  runtime
    .set_table_data("T", frame(json!([{"A": 1}, {"A": 3}])))
    .unwrap();

  runtime.execute_workflow().wait().await.unwrap();
  assert_eq!(numbers(&runtime, "T", "scaled"), vec![Some(-1.0), Some(1.0)]);
}

#[tokio::test]
async fn test_parallel_matches_sequential() {
  let config = RuntimeConfig {
    execution_mode: ExecutionMode::Parallel,
    ..RuntimeConfig::default()
  };
  let parallel = runtime_with(link_aggregate(), config);
  seed_link_aggregate(&parallel);
  let sequential = runtime(link_aggregate());
  seed_link_aggregate(&sequential);

  let a = parallel.execute_workflow().wait().await.unwrap();
  let b = sequential.execute_workflow().wait().await.unwrap();
  assert_eq!(a.outcomes, b.outcomes);
  assert_eq!(parallel.table_data("Groups"), sequential.table_data("Groups"));
  assert_eq!(parallel.table_data("Facts"), sequential.table_data("Facts"));
}

fn failing_workflow() -> Value {
  json!({
    "tables": [
      {"id": "T", "columns": [
        {"id": "Bad", "function": "my:missing", "inputs": ["A"]},
        {"id": "Good", "function": "std:float", "inputs": ["A"]}
      ]},
      {"id": "U", "columns": [
        {"id": "C", "function": "std:float", "inputs": ["Good"]}
      ]}
    ]
  })
}

#[tokio::test]
async fn test_fail_fast_reports_node() {
  let runtime = runtime(failing_workflow());
  runtime.set_table_data("T", frame(json!([{"A": 1}]))).unwrap();

  let result = runtime.execute_workflow().wait().await;
  match result {
    Err(RuntimeError::Node { node, kind, .. }) => {
      assert_eq!(node, "T.Bad");
      assert_eq!(kind, "calculate");
    }
    other => panic!("expected a node failure, got {:?}", other),
  }
  // The sibling after the failure never ran.
  assert!(!runtime.table_data("T").unwrap().contains("Good"));
}

#[tokio::test]
async fn test_continue_skips_dependents() {
  let config = RuntimeConfig {
    failure_policy: FailurePolicy::Continue,
    ..RuntimeConfig::default()
  };
  let runtime = runtime_with(failing_workflow(), config);
  runtime.set_table_data("T", frame(json!([{"A": 1}]))).unwrap();

  let result = runtime.execute_workflow().wait().await.unwrap();
  assert!(!result.is_success());

  let bad = result.outcome("T.Bad").unwrap();
  assert!(matches!(&bad.status, NodeStatus::Failed { error } if error.contains("my:missing")));
  assert_eq!(result.outcome("T.Good").unwrap().status, NodeStatus::Completed);
  // U extends T, so U and its column depend on the failed node.
  assert_eq!(result.outcome("U").unwrap().status, NodeStatus::Skipped);
  assert_eq!(result.outcome("U.C").unwrap().status, NodeStatus::Skipped);
  assert_eq!(result.skipped().count(), 2);
}

#[tokio::test]
async fn test_rerun_starts_from_supplied_data() {
  let runtime = runtime(json!({
    "tables": [{"id": "T", "columns": [
      {"id": "A", "function": "std:add", "inputs": ["A"], "model": {"value": 1}}
    ]}]
  }));
  runtime.set_table_data("T", frame(json!([{"A": 1}]))).unwrap();

  let first = runtime.execute_workflow().wait().await.unwrap();
  runtime.execute_workflow().wait().await.unwrap();
  let second = runtime.execute_workflow().wait().await.unwrap();

  assert_ne!(first.execution_id, second.execution_id);
  assert_eq!(runtime.table_data("T").unwrap().column("A").unwrap(), &[json!(2)]);
}
