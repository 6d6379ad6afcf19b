mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{at, init_tracing, paris_trip};
use journy::config::ClientOptions;
use journy::mapper::{DocumentMapper, Decoded};
use journy::models::Expense;
use journy::store::{DocumentStore, MemoryStore};
use journy::trips::TripStore;
use journy::error::Error;
use journy::Journy;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}

fn trips_for(store: Arc<MemoryStore>) -> TripStore {
    TripStore::new(store, "user-1", &ClientOptions::default()).unwrap()
}

#[tokio::test]
async fn test_paris_lunch_scenario() {
    init_tracing();
    let journy = Journy::in_memory();
    journy.sign_up("traveller@example.com", "secret1").await.unwrap();
    let trips = journy.trips().unwrap();

    let paris = paris_trip();
    trips.add_trip(&paris).await.unwrap();
    let lunch = Expense::new("Lunch", Decimal::new(2550, 2), at(2024, 5, 2, 0));
    trips.add_expense(&paris.id, &lunch).await.unwrap();

    let expenses = trips.fetch_expenses(&paris.id).await.unwrap();
    assert_eq!(expenses, Decoded::Complete(vec![lunch.clone()]));

    let trip = trips.fetch_trip(&paris.id).await.unwrap().into_value().unwrap();
    assert_eq!(trip.total_expenses(), Decimal::new(2550, 2));
    let days: Vec<_> = trip.expenses_by_day().into_keys().collect();
    assert_eq!(days, vec![at(2024, 5, 2, 0).date_naive()]);
}

#[tokio::test]
async fn test_delete_leaves_other_entries_untouched() {
    for size in 0..6usize {
        for target in 0..size.max(1) {
            let memory = Arc::new(MemoryStore::new());
            let trips = trips_for(memory.clone());
            let paris = paris_trip();
            trips.add_trip(&paris).await.unwrap();

            let expenses: Vec<Expense> = (0..size)
                .map(|i| {
                    let when = at(2024, 5, 2, i as u32);
                    Expense::new(format!("item {}", i), Decimal::from(i as i64), when)
                })
                .collect();
            for expense in &expenses {
                trips.add_expense(&paris.id, expense).await.unwrap();
            }
            let before = memory.get(trips.collection(), &paris.id).await.unwrap().unwrap();
            let stored_before = before.fields["expenses"].as_array().cloned().unwrap();

            if size == 0 {
                assert!(matches!(
                    trips.delete_expense(&paris.id, "absent").await,
                    Err(Error::EntryNotFound { .. })
                ));
                let after = memory.get(trips.collection(), &paris.id).await.unwrap().unwrap();
                assert_eq!(after.fields["expenses"], Value::Array(stored_before));
                continue;
            }

            trips.delete_expense(&paris.id, &expenses[target].id).await.unwrap();

            let after = memory.get(trips.collection(), &paris.id).await.unwrap().unwrap();
            let mut expected = stored_before.clone();
            expected.remove(target);
            assert_eq!(
                after.fields["expenses"],
                Value::Array(expected),
                "size {} target {}",
                size,
                target
            );
            assert_eq!(after.fields["title"], before.fields["title"]);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expense_adds_all_persist() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let trips = trips_for(memory);
    let paris = paris_trip();
    trips.add_trip(&paris).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let trips = trips.clone();
        let trip_id = paris.id.clone();
        handles.push(tokio::spawn(async move {
            let expense =
                Expense::new(format!("coffee {}", i), Decimal::new(350, 2), at(2024, 5, 3, 9));
            trips.add_expense(&trip_id, &expense).await.map(|_| expense.id)
        }));
    }

    let mut added = Vec::new();
    for handle in handles {
        added.push(handle.await.unwrap().unwrap());
    }

    let stored = trips.fetch_expenses(&paris.id).await.unwrap().into_value().unwrap();
    assert_eq!(stored.len(), 8);
    for id in added {
        assert!(stored.iter().any(|e| e.id == id), "expense {} lost", id);
    }
}

#[tokio::test]
async fn test_broken_records_are_reported_not_defaulted() {
    let memory = Arc::new(MemoryStore::new());
    let trips = trips_for(memory.clone());
    let paris = paris_trip();
    trips.add_trip(&paris).await.unwrap();
    let lunch = Expense::new("Lunch", Decimal::new(2550, 2), at(2024, 5, 2, 0));
    trips.add_expense(&paris.id, &lunch).await.unwrap();

    let mut no_amount = lunch.to_document();
    no_amount.remove("amount");
    no_amount.insert("id".into(), Value::from("no-amount"));
    let mut doc = memory.get(trips.collection(), &paris.id).await.unwrap().unwrap().fields;
    doc["expenses"].as_array_mut().unwrap().push(Value::Object(no_amount));
    memory.put(trips.collection(), &paris.id, doc).await.unwrap();

    match trips.fetch_trip(&paris.id).await.unwrap() {
        Decoded::Partial { value, warnings } => {
            assert_eq!(value.expenses, vec![lunch]);
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].id.as_deref(), Some("no-amount"));
            assert_eq!(warnings[0].trip_id.as_deref(), Some(paris.id.as_str()));
            assert_eq!(warnings[0].error.field, "amount");
        }
        other => panic!("expected a partial trip, got {:?}", other),
    }

    let expenses = trips.fetch_expenses(&paris.id).await.unwrap();
    assert_eq!(expenses.warnings()[0].trip_id.as_deref(), Some(paris.id.as_str()));
}

#[tokio::test]
async fn test_subscription_follows_changes() {
    init_tracing();
    let memory = Arc::new(MemoryStore::new());
    let trips = trips_for(memory);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = trips
        .subscribe(move |result| {
            let count = result.ok().and_then(|d| d.into_value()).map(|v| v.len());
            let _ = tx.send(count);
        })
        .await
        .unwrap();

    assert_eq!(recv(&mut rx).await, Some(0));

    let paris = paris_trip();
    trips.add_trip(&paris).await.unwrap();
    assert_eq!(recv(&mut rx).await, Some(1));

    drop(subscription);
    trips.delete_trip(&paris.id).await.unwrap();
    assert_eq!(tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap(), None);
}
