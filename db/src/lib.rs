//! Persistence adapters: thin typed queries for sequences, blocks,
//! variables, global lists, runs and block-runs, with owner-scoped reads
//! baked into every query predicate rather than checked after the fact.

pub mod blocks;
pub mod error;
pub mod global_lists;
pub mod pool;
pub mod runs;
pub mod schema;
pub mod sequences;
pub mod users;
pub mod variables;

pub use error::{DbError, Result};
pub use pool::{connect, Pool};

#[cfg(test)]
mod tests {
    use super::*;
    use promptgraph_core::model::{BlockConfig, VariableType};
    use serde_json::json;

    async fn test_pool() -> Pool {
        connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn user_registration_and_lookup_round_trips() {
        let pool = test_pool().await;
        let user = users::create(&pool, "ada@example.com", "hash").await.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let dup = users::create(&pool, "ada@example.com", "hash2").await;
        assert!(dup.is_err());

        let found = users::get_by_email(&pool, "ada@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn sequence_ownership_scopes_reads() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner@example.com", "hash").await.unwrap();
        let other = users::create(&pool, "other@example.com", "hash").await.unwrap();

        let seq = sequences::create(&pool, owner.id, "My Sequence", None).await.unwrap();

        assert!(sequences::get_by_id_and_owner(&pool, seq.id, owner.id)
            .await
            .unwrap()
            .is_some());
        assert!(sequences::get_by_id_and_owner(&pool, seq.id, other.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn block_config_round_trips_through_storage() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner2@example.com", "hash").await.unwrap();
        let seq = sequences::create(&pool, owner.id, "Seq", None).await.unwrap();

        let config = BlockConfig::Discretization {
            prompt: "Write about {{topic}}".to_string(),
            output_names: vec!["title".to_string(), "body".to_string()],
        };
        let block = blocks::create(&pool, seq.id, "Discretize", 0, &config).await.unwrap();

        let fetched = blocks::get_by_id_and_sequence(&pool, block.id, seq.id)
            .await
            .unwrap()
            .unwrap();
        match fetched.config {
            BlockConfig::Discretization { output_names, .. } => {
                assert_eq!(output_names, vec!["title", "body"]);
            }
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[tokio::test]
    async fn block_lookup_by_owner_excludes_other_users() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner2b@example.com", "hash").await.unwrap();
        let other = users::create(&pool, "other2b@example.com", "hash").await.unwrap();
        let seq = sequences::create(&pool, owner.id, "Seq", None).await.unwrap();

        let config = BlockConfig::Standard {
            prompt: "Hello {{name}}".to_string(),
            output_variable_name: "greeting".to_string(),
        };
        let block = blocks::create(&pool, seq.id, "Greet", 0, &config).await.unwrap();

        assert!(blocks::get_by_id_and_owner(&pool, block.id, owner.id)
            .await
            .unwrap()
            .is_some());
        assert!(blocks::get_by_id_and_owner(&pool, block.id, other.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn variable_name_uniqueness_is_enforced_per_sequence() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner3@example.com", "hash").await.unwrap();
        let seq = sequences::create(&pool, owner.id, "Seq", None).await.unwrap();

        variables::create(&pool, seq.id, "topic", VariableType::Global, &json!({"value": "bees"}), None)
            .await
            .unwrap();

        let dup = variables::create(
            &pool,
            seq.id,
            "topic",
            VariableType::Input,
            &json!({"default": "x"}),
            None,
        )
        .await;
        assert!(matches!(dup, Err(DbError::Duplicate(_))));
    }

    #[tokio::test]
    async fn variable_lookup_by_owner_excludes_other_users() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner3b@example.com", "hash").await.unwrap();
        let other = users::create(&pool, "other3b@example.com", "hash").await.unwrap();
        let seq = sequences::create(&pool, owner.id, "Seq", None).await.unwrap();

        let var = variables::create(&pool, seq.id, "topic", VariableType::Global, &json!({"value": "bees"}), None)
            .await
            .unwrap();

        assert!(variables::get_by_id_and_owner(&pool, var.id, owner.id)
            .await
            .unwrap()
            .is_some());
        assert!(variables::get_by_id_and_owner(&pool, var.id, other.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn global_list_items_are_returned_in_order() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner4@example.com", "hash").await.unwrap();
        let list = global_lists::create(&pool, owner.id, "animals", None).await.unwrap();

        global_lists::add_item(&pool, list.id, "cat", None).await.unwrap();
        global_lists::add_item(&pool, list.id, "dog", None).await.unwrap();
        global_lists::add_item(&pool, list.id, "owl", None).await.unwrap();

        let reloaded = global_lists::get_by_id_and_owner(&pool, list.id, owner.id)
            .await
            .unwrap()
            .unwrap();
        let values: Vec<_> = reloaded.items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["cat", "dog", "owl"]);
    }

    #[tokio::test]
    async fn run_lifecycle_persists_block_run_trace() {
        let pool = test_pool().await;
        let owner = users::create(&pool, "owner5@example.com", "hash").await.unwrap();
        let seq = sequences::create(&pool, owner.id, "Seq", None).await.unwrap();

        let run = runs::create(&pool, seq.id, owner.id, &json!({"name": "World"}))
            .await
            .unwrap();
        assert_eq!(run.status.as_str(), "pending");

        let started = chrono::Utc::now();
        runs::mark_running(&pool, run.id, started).await.unwrap();

        let block_run = runs::create_block_run(
            &pool,
            run.id,
            Some(1),
            "Greeting",
            promptgraph_core::model::BlockType::Standard,
            started,
        )
        .await
        .unwrap();

        runs::complete_block_run(
            &pool,
            block_run.id,
            promptgraph_core::model::RunStatus::Completed,
            Some("Hello World"),
            Some("Hello World"),
            Some(&json!({"greeting": "Hello World"})),
            None,
            None,
            None,
            chrono::Utc::now(),
            Some(10),
            Some(5),
            Some(0.002),
        )
        .await
        .unwrap();

        runs::mark_terminal(
            &pool,
            run.id,
            promptgraph_core::model::RunStatus::Completed,
            chrono::Utc::now(),
            &json!({"total_blocks": 1}),
        )
        .await
        .unwrap();

        let reloaded = runs::get_by_id_and_owner(&pool, run.id, owner.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status.as_str(), "completed");

        let block_runs = runs::list_block_runs_for_run(&pool, run.id).await.unwrap();
        assert_eq!(block_runs.len(), 1);
        assert_eq!(block_runs[0].status.as_str(), "completed");
        assert_eq!(
            block_runs[0].named_outputs.as_ref().unwrap()["greeting"],
            json!("Hello World")
        );
    }
}
