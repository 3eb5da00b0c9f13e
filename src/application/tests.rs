//! End-to-end command scenarios against both store backends

use std::sync::Arc;

use crate::application::errors::ErrorKind;
use crate::application::messaging::dispatcher::Outcome;
use crate::application::messaging::CommandDispatcher;
use crate::domain::entities::CommandKind;
use crate::domain::traits::TaskStore;
use crate::infrastructure::database::SqliteStore;
use crate::infrastructure::storage::MemoryStore;

async fn full_lifecycle(store: Arc<dyn TaskStore>) {
    let d = CommandDispatcher::new(store, "todobot");

    let help = d.dispatch("T1", "help").await;
    assert_eq!(help.outcome, Outcome::Help);
    for keyword in ["add", "list", "done", "delete", "help"] {
        assert!(help.text.contains(keyword), "help is missing {}", keyword);
    }

    let added = d.dispatch("T1", "add Write report").await;
    let Outcome::Added(task) = added.outcome.clone() else {
        panic!("expected Added, got {:?}", added.outcome);
    };
    assert!(added.text.contains(&task.id.to_string()));
    assert!(added.text.contains("Write report"));

    let listed = d.dispatch("T1", "list").await;
    let Outcome::Listed(tasks) = &listed.outcome else {
        panic!("expected Listed, got {:?}", listed.outcome);
    };
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
    assert_eq!(tasks[0].content, "Write report");
    assert!(!tasks[0].completed);
    assert!(listed.text.contains(&format!("⏸️ *[{}]* Write report", task.id)));

    let done = d.dispatch("T1", &format!("done {}", task.id)).await;
    assert!(matches!(done.outcome, Outcome::Completed(ref t) if t.id == task.id && t.completed));
    assert!(done.text.contains(&format!("[{}]", task.id)));

    let listed = d.dispatch("T1", "list").await;
    let Outcome::Listed(tasks) = &listed.outcome else {
        panic!("expected Listed, got {:?}", listed.outcome);
    };
    assert!(tasks[0].completed);
    assert!(tasks[0].completed_at.is_some());
    assert!(listed.text.contains(&format!("✅ *[{}]* Write report", task.id)));

    let deleted = d.dispatch("T1", &format!("delete {}", task.id)).await;
    assert_eq!(deleted.outcome, Outcome::Deleted(task.id));

    let listed = d.dispatch("T1", "list").await;
    assert_eq!(listed.outcome, Outcome::Listed(vec![]));
    assert!(listed.text.contains("no TODOs"));

    let again = d.dispatch("T1", &format!("delete {}", task.id)).await;
    assert_eq!(
        again.outcome,
        Outcome::Rejected { command: CommandKind::Delete, error: ErrorKind::NotFound }
    );
}

#[tokio::test]
async fn test_full_lifecycle_in_memory() {
    full_lifecycle(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_full_lifecycle_sqlite() {
    full_lifecycle(Arc::new(SqliteStore::open_in_memory().unwrap())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch_across_workspaces() {
    let d = Arc::new(CommandDispatcher::new(Arc::new(MemoryStore::new()), "todobot"));

    let mut handles = Vec::new();
    for i in 0..50 {
        let d = d.clone();
        let workspace = if i % 2 == 0 { "T-even" } else { "T-odd" };
        handles.push(tokio::spawn(async move {
            d.dispatch(workspace, &format!("add item {}", i)).await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap().outcome, Outcome::Added(_)));
    }

    for workspace in ["T-even", "T-odd"] {
        let Outcome::Listed(tasks) = d.dispatch(workspace, "list").await.outcome else {
            panic!("expected Listed");
        };
        let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        assert!(tasks.iter().all(|t| t.workspace_id == workspace));
    }
}
