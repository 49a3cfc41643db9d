#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cerebral_core::{
        BranchRegistry, CerebralError, MemoryInput, Provenance, ProvenanceFilter,
    };
    use cerebral_memory::{
        AddOutcome, DEMO_TAG, FallbackProvider, LOCAL_TAG, LocalMemoryStore, MemoryClient,
        MockCall, MockMemoryBackend, filter_by_provenance,
    };
    use serde_json::json;

    fn client_with(backend: Arc<MockMemoryBackend>) -> MemoryClient {
        let store = LocalMemoryStore::open_in_memory().unwrap();
        MemoryClient::new(backend, FallbackProvider::new(store, 3), "tester")
    }

    fn seeded() -> Arc<MockMemoryBackend> {
        Arc::new(
            MockMemoryBackend::new()
                .with_record(json!({
                    "id": "e1",
                    "memory": "Trip to Lisbon",
                    "brain_region": "TEMPORAL_LOBE",
                    "metadata": {"memory_type": "episodic", "importance": 0.8}
                }))
                .with_record(json!({
                    "id": "e2",
                    "memory": "Agent summarised the trip",
                    "brain_region": "TEMPORAL_LOBE",
                    "metadata": {"memory_type": "agent"}
                }))
                .with_record(json!({
                    "id": "w1",
                    "content": "Refactor the stats endpoint",
                    "brain_region": "PARIETAL_LOBE",
                    "metadata": {"memory_type": "working"}
                })),
        )
    }

    // ── Loading ────────────────────────────────────────────────

    mod load {
        use super::*;

        #[tokio::test]
        async fn test_load_scopes_to_branch_domain() {
            let backend = seeded();
            let client = client_with(backend.clone());

            let fetched = client.load_memories("Episodic").await.unwrap();
            assert!(!fetched.is_degraded());
            let memories = fetched.into_data();
            assert_eq!(memories.len(), 2);
            assert!(memories.iter().all(|m| m.branch == "Episodic"));

            match &backend.recorded_calls()[0] {
                MockCall::Search(req) => {
                    assert_eq!(req.query, "");
                    assert_eq!(req.brain_region.as_deref(), Some("TEMPORAL_LOBE"));
                    assert_eq!(req.user_id, "tester");
                }
                other => panic!("unexpected call {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_load_updates_cache() {
            let client = client_with(seeded());
            client.load_memories("Working").await.unwrap();
            assert_eq!(client.current_branch().as_deref(), Some("Working"));
            assert_eq!(client.cached_memories().len(), 1);
            assert!(!client.is_degraded());
        }

        #[tokio::test]
        async fn test_offline_load_returns_three_demo_entries() {
            let client = client_with(Arc::new(MockMemoryBackend::unreachable()));
            let fetched = client.load_memories("Episodic").await.unwrap();

            assert!(fetched.is_degraded());
            assert!(fetched.degraded_reason().is_some());
            let memories = fetched.into_data();
            assert_eq!(memories.len(), 3);
            for memory in &memories {
                assert!(memory.tags.contains(DEMO_TAG));
                assert_eq!(memory.branch, "Episodic");
                assert!(memory.is_demo());
            }
            assert!(client.is_degraded());
        }

        #[tokio::test]
        async fn test_single_failure_degrades_once() {
            let backend = seeded();
            let client = client_with(backend.clone());
            backend.fail_next("HTTP 503");

            let first = client.load_memories("Working").await.unwrap();
            assert_eq!(first.degraded_reason(), Some("transport failure: HTTP 503"));
            let second = client.load_memories("Working").await.unwrap();
            assert!(!second.is_degraded());
            assert_eq!(second.data()[0].id, "w1");
        }

        #[tokio::test]
        async fn test_unknown_branch_is_rejected() {
            let backend = seeded();
            let client = client_with(backend.clone());
            let err = client.load_memories("Cortex").await.unwrap_err();
            assert!(matches!(err, CerebralError::UnknownBranch(name) if name == "Cortex"));
            assert!(backend.recorded_calls().is_empty());
        }

        #[tokio::test]
        async fn test_records_without_content_are_dropped() {
            let backend = Arc::new(
                MockMemoryBackend::new()
                    .with_record(json!({"id": "a", "brain_region": "CEREBELLUM"}))
                    .with_record(json!({"id": "b", "memory": "kept", "brain_region": "CEREBELLUM"})),
            );
            let client = client_with(backend);
            let memories = client.load_memories("System").await.unwrap().into_data();
            assert_eq!(memories.len(), 1);
            assert_eq!(memories[0].id, "b");
        }
    }

    // ── Provenance ─────────────────────────────────────────────

    mod provenance {
        use super::*;

        #[tokio::test]
        async fn test_agent_kind_is_system() {
            let client = client_with(seeded());
            let memories = client.load_memories("Episodic").await.unwrap().into_data();
            let agent = memories.iter().find(|m| m.id == "e2").unwrap();
            assert_eq!(agent.provenance, Provenance::System);
            let trip = memories.iter().find(|m| m.id == "e1").unwrap();
            assert_eq!(trip.provenance, Provenance::User);
        }

        #[tokio::test]
        async fn test_filter_partitions_branch() {
            let client = client_with(seeded());
            let memories = client.load_memories("Episodic").await.unwrap().into_data();

            let all = filter_by_provenance(memories.clone(), ProvenanceFilter::All);
            assert_eq!(all.len(), memories.len());
            let ids: Vec<_> = all.iter().map(|m| m.id.clone()).collect();
            let original: Vec<_> = memories.iter().map(|m| m.id.clone()).collect();
            assert_eq!(ids, original);

            let system = filter_by_provenance(memories.clone(), ProvenanceFilter::System);
            let user = filter_by_provenance(memories.clone(), ProvenanceFilter::User);
            assert_eq!(system.len() + user.len(), memories.len());
            assert!(system.iter().all(|m| m.provenance == Provenance::System));
            assert!(user.iter().all(|m| m.provenance == Provenance::User));
        }
    }

    // ── Adding ─────────────────────────────────────────────────

    mod add {
        use super::*;

        #[tokio::test]
        async fn test_empty_input_makes_no_remote_call() {
            let backend = seeded();
            let client = client_with(backend.clone());
            let err = client
                .add_memory("Working", &MemoryInput::default())
                .await
                .unwrap_err();
            assert!(matches!(err, CerebralError::EmptyMemoryInput));
            assert!(backend.recorded_calls().is_empty());
        }

        #[tokio::test]
        async fn test_add_sends_domain_and_kind_then_refreshes() {
            let backend = seeded();
            let client = client_with(backend.clone());
            let input = MemoryInput {
                title: Some("Idea".into()),
                content: Some("Cache branch stats".into()),
                ..Default::default()
            };

            let outcome = client.add_memory("Working", &input).await.unwrap();
            let AddOutcome::Created { refreshed } = outcome else {
                panic!("expected a remote create");
            };
            assert_eq!(refreshed.data().len(), 2);

            let calls = backend.recorded_calls();
            let MockCall::Add(req) = &calls[0] else {
                panic!("first call should be add");
            };
            assert_eq!(req.brain_region, "PARIETAL_LOBE");
            assert_eq!(req.content, "Idea\n\nCache branch stats");
            assert_eq!(req.metadata["memory_type"], "working");
            assert_eq!(req.metadata["title"], "Idea");
            assert!(matches!(calls[1], MockCall::Search(_)));
        }

        #[tokio::test]
        async fn test_failed_add_is_kept_locally() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("local.db");
            let store = LocalMemoryStore::open(&path).unwrap();
            let backend = Arc::new(MockMemoryBackend::unreachable());
            let client = MemoryClient::new(backend, FallbackProvider::new(store, 3), "tester");

            let input = MemoryInput {
                url: Some("https://example.com/paper".into()),
                ..Default::default()
            };
            let outcome = client.add_memory("Personal", &input).await.unwrap();
            let AddOutcome::StoredLocally(memory) = outcome else {
                panic!("expected a local create");
            };
            assert_eq!(memory.provenance, Provenance::User);
            assert_eq!(memory.branch, "Personal");
            assert_eq!(memory.content, "https://example.com/paper");
            assert!(memory.tags.contains(LOCAL_TAG));

            // Survives reopening the store.
            let reopened = LocalMemoryStore::open(&path).unwrap();
            let stored = reopened.list("Personal").unwrap();
            assert_eq!(stored.len(), 1);
            assert_eq!(stored[0].id, memory.id);
            assert_eq!(client.local_memories("Personal").unwrap().len(), 1);
            assert!(client.local_memories("Working").unwrap().is_empty());
        }
    }

    // ── Removing ───────────────────────────────────────────────

    mod remove {
        use super::*;

        #[tokio::test]
        async fn test_remove_refreshes_current_branch() {
            let backend = seeded();
            let client = client_with(backend.clone());
            client.load_memories("Episodic").await.unwrap();

            let refreshed = client.remove_memory("e1").await.unwrap().unwrap();
            assert_eq!(refreshed.data().len(), 1);
            assert_eq!(client.cached_memories()[0].id, "e2");
        }

        #[tokio::test]
        async fn test_remove_without_loaded_branch_skips_refresh() {
            let client = client_with(seeded());
            assert!(client.remove_memory("w1").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_delete_failure_is_reported() {
            let backend = seeded();
            let client = client_with(backend.clone());
            client.load_memories("Episodic").await.unwrap();

            backend.set_offline(true);
            let err = client.remove_memory("e1").await.unwrap_err();
            match err {
                CerebralError::DeleteFailed { id, .. } => assert_eq!(id, "e1"),
                other => panic!("unexpected error {other}"),
            }
            // Cache is untouched.
            assert_eq!(client.cached_memories().len(), 2);
        }

        #[tokio::test]
        async fn test_missing_id_is_a_failure() {
            let client = client_with(seeded());
            let err = client.remove_memory("nope").await.unwrap_err();
            assert!(matches!(err, CerebralError::DeleteFailed { .. }));
        }
    }

    // ── Searching ──────────────────────────────────────────────

    mod search {
        use super::*;

        #[tokio::test]
        async fn test_global_search_attributes_branches() {
            let backend = seeded();
            let client = client_with(backend.clone());
            let results = client.search_memories("the", None).await.unwrap().into_data();

            assert_eq!(results.len(), 2);
            let e2 = results.iter().find(|m| m.id == "e2").unwrap();
            assert_eq!(e2.branch, "Episodic");
            let w1 = results.iter().find(|m| m.id == "w1").unwrap();
            assert_eq!(w1.branch, "Working");

            let MockCall::Search(req) = &backend.recorded_calls()[0] else {
                panic!("expected search");
            };
            assert!(req.brain_region.is_none());
            assert_eq!(req.query, "the");
        }

        #[tokio::test]
        async fn test_scoped_search() {
            let client = client_with(seeded());
            let results = client
                .search_memories("trip", Some("Episodic"))
                .await
                .unwrap()
                .into_data();
            assert_eq!(results.len(), 2);
        }

        #[tokio::test]
        async fn test_offline_search_matches_demo_samples() {
            let client = client_with(Arc::new(MockMemoryBackend::unreachable()));
            let fetched = client.search_memories("demo", Some("Episodic")).await.unwrap();
            assert!(fetched.is_degraded());
            let results = fetched.into_data();
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|m| m.branch == "Episodic"));
        }
    }

    // ── Stats ──────────────────────────────────────────────────

    mod stats {
        use super::*;

        #[tokio::test]
        async fn test_stats_cover_every_branch() {
            let client = client_with(seeded());
            let fetched = client.get_stats().await;
            assert!(!fetched.is_degraded());
            let stats = fetched.into_data();
            assert!(!stats.fallback_mode);
            assert_eq!(stats.branches.len(), BranchRegistry::all().len());
            assert_eq!(stats.total_memories, 3);

            let episodic = &stats.branches["Episodic"];
            assert_eq!(episodic.total_memories, 2);
            assert_eq!(episodic.system_generated, 1);
            assert_eq!(episodic.user_generated, 1);
            assert_eq!(stats.branches["Personal"].total_memories, 0);
        }

        #[tokio::test]
        async fn test_offline_stats_are_flagged() {
            let client = client_with(Arc::new(MockMemoryBackend::unreachable()));
            let fetched = client.get_stats().await;
            assert!(fetched.is_degraded());
            assert!(fetched.data().fallback_mode);
            assert_eq!(fetched.data().branches.len(), BranchRegistry::all().len());
            assert!(client.cached_stats().is_some());
        }

        #[tokio::test]
        async fn test_stats_or_empty_is_all_zero_offline() {
            let client = client_with(Arc::new(MockMemoryBackend::unreachable()));
            let stats = client.get_stats_or_empty().await.into_data();
            assert_eq!(stats.total_memories, 0);
            assert!(stats.branches.values().all(|b| b.total_memories == 0));
        }
    }
}
