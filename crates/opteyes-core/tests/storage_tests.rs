use opteyes_core::storage::queries::PENDING_PATH;
use opteyes_core::storage::{Database, DatapointUpdate, IndexStore};
use opteyes_core::Error;
use tempfile::tempdir;

fn seeded() -> (Database, i64, i64) {
    let db = Database::open_in_memory().unwrap();
    let cats = db.insert_dataset("cats", "/data/cats").unwrap();
    let dogs = db.insert_dataset("dogs", "/data/dogs").unwrap();
    (db, cats, dogs)
}

#[test]
fn test_insert_and_find_dataset() {
    let (db, cats, dogs) = seeded();
    assert_ne!(cats, dogs);

    let found = db.find_dataset_by_path("/data/cats").unwrap().unwrap();
    assert_eq!(found.id, cats);
    assert_eq!(found.name, "cats");

    assert_eq!(db.find_dataset_by_id(dogs).unwrap().unwrap().path, "/data/dogs");
    assert_eq!(db.find_dataset_by_name("dogs").unwrap().unwrap().id, dogs);
    assert!(db.find_dataset_by_path("/data/birds").unwrap().is_none());
    assert!(db.find_dataset_by_name("birds").unwrap().is_none());
}

#[test]
fn test_dataset_path_is_unique() {
    let (db, _, _) = seeded();
    let err = db.insert_dataset("cats-again", "/data/cats").unwrap_err();
    assert!(matches!(err, Error::Database(_)));
}

#[test]
fn test_insert_datapoint_with_explicit_id() {
    let (db, cats, _) = seeded();
    db.insert_datapoint(42, "/data/cats/tabby/42", cats).unwrap();

    let dp = db.find_datapoint_by_id(42).unwrap().unwrap();
    assert_eq!(dp.path, "/data/cats/tabby/42");
    assert_eq!(dp.dataset_id, cats);
    assert!(db.find_datapoint_by_id(43).unwrap().is_none());
}

#[test]
fn test_insert_datapoint_rejects_unknown_dataset() {
    let (db, _, _) = seeded();
    let err = db.insert_datapoint(1, "/nowhere/1", 999).unwrap_err();
    assert!(matches!(err, Error::Constraint(_)), "got {:?}", err);
    assert!(db.find_datapoint_by_id(1).unwrap().is_none());
}

#[test]
fn test_auto_id_then_update_path() {
    let (db, cats, _) = seeded();
    db.insert_datapoint(10, "/data/cats/tabby/10", cats).unwrap();

    let id = db.insert_datapoint_auto_id(cats).unwrap();
    assert!(id > 10);
    assert_eq!(db.find_datapoint_by_id(id).unwrap().unwrap().path, PENDING_PATH);

    let dir = format!("/data/cats/tabby/{}", id);
    db.update_path(id, &dir).unwrap();
    let dp = db.find_datapoint_by_id(id).unwrap().unwrap();
    assert_eq!(dp.path, dir);
    assert_eq!(dp.dataset_id, cats);
}

#[test]
fn test_auto_id_after_max_id_is_exhausted() {
    let (db, cats, _) = seeded();
    db.insert_datapoint(i64::MAX, "/data/cats/tabby/max", cats).unwrap();

    let err = db.insert_datapoint_auto_id(cats).unwrap_err();
    assert!(matches!(err, Error::IdsExhausted), "got {:?}", err);
}

#[test]
fn test_partial_update_only_touches_given_fields() {
    let (db, cats, dogs) = seeded();
    db.insert_datapoint(5, "/data/cats/tabby/5", cats).unwrap();

    let moved = DatapointUpdate {
        path: None,
        dataset_id: Some(dogs),
    };
    assert!(db.update_datapoint(5, &moved).unwrap());
    let dp = db.find_datapoint_by_id(5).unwrap().unwrap();
    assert_eq!(dp.path, "/data/cats/tabby/5");
    assert_eq!(dp.dataset_id, dogs);

    let renamed = DatapointUpdate {
        path: Some("/data/dogs/pug/5".to_string()),
        dataset_id: None,
    };
    assert!(db.update_datapoint(5, &renamed).unwrap());
    let dp = db.find_datapoint_by_id(5).unwrap().unwrap();
    assert_eq!(dp.path, "/data/dogs/pug/5");
    assert_eq!(dp.dataset_id, dogs);

    assert!(!db.update_datapoint(5, &DatapointUpdate::default()).unwrap());
}

#[test]
fn test_update_rejects_unknown_dataset_and_missing_row() {
    let (db, cats, _) = seeded();
    db.insert_datapoint(5, "/data/cats/tabby/5", cats).unwrap();

    let bad = DatapointUpdate {
        path: None,
        dataset_id: Some(12345),
    };
    assert!(matches!(
        db.update_datapoint(5, &bad).unwrap_err(),
        Error::Constraint(_)
    ));
    assert_eq!(db.find_datapoint_by_id(5).unwrap().unwrap().dataset_id, cats);

    assert!(matches!(
        db.update_path(77, "/x").unwrap_err(),
        Error::NotFound(_)
    ));
}

#[test]
fn test_list_and_delete() {
    let (db, cats, dogs) = seeded();
    db.insert_datapoint(3, "/data/cats/a/3", cats).unwrap();
    db.insert_datapoint(1, "/data/dogs/b/1", dogs).unwrap();
    db.insert_datapoint(2, "/data/cats/a/2", cats).unwrap();

    let ids: Vec<i64> = db.list_datapoints().unwrap().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(db.list_datasets().unwrap().len(), 2);
    assert_eq!(db.count_datapoints_in_dataset(cats).unwrap(), 2);

    assert!(db.delete_datapoint(3).unwrap());
    assert!(!db.delete_datapoint(3).unwrap());
    assert_eq!(db.count_datapoints_in_dataset(cats).unwrap(), 1);
}

#[test]
fn test_delete_dataset_cascades_to_datapoints() {
    let (db, cats, dogs) = seeded();
    db.insert_datapoint(1, "/data/cats/a/1", cats).unwrap();
    db.insert_datapoint(2, "/data/dogs/b/2", dogs).unwrap();

    assert!(db.delete_dataset(cats).unwrap());
    assert!(db.find_datapoint_by_id(1).unwrap().is_none());
    assert!(db.find_datapoint_by_id(2).unwrap().is_some());
    assert!(db.find_dataset_by_id(cats).unwrap().is_none());
}

#[test]
fn test_uncommitted_transaction_rolls_back() {
    let (db, cats, _) = seeded();
    {
        let tx = db.begin().unwrap();
        tx.insert_datapoint(8, "/data/cats/a/8", cats).unwrap();
        tx.delete_dataset(cats).unwrap();
        assert!(tx.find_dataset_by_id(cats).unwrap().is_none());
    }
    assert!(db.find_datapoint_by_id(8).unwrap().is_none());
    assert!(db.find_dataset_by_id(cats).unwrap().is_some());

    let tx = db.begin().unwrap();
    tx.insert_datapoint(8, "/data/cats/a/8", cats).unwrap();
    tx.commit().unwrap();
    assert!(db.find_datapoint_by_id(8).unwrap().is_some());
}

#[test]
fn test_truncate_all() {
    let (db, cats, _) = seeded();
    db.insert_datapoint(1, "/data/cats/a/1", cats).unwrap();
    db.truncate_all().unwrap();
    assert!(db.list_datasets().unwrap().is_empty());
    assert!(db.list_datapoints().unwrap().is_empty());
}

#[test]
fn test_reopen_keeps_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::open(path).unwrap();
        let id = db.insert_dataset("cats", "/data/cats").unwrap();
        db.insert_datapoint(4, "/data/cats/a/4", id).unwrap();
    }

    let db = Database::open(path).unwrap();
    assert_eq!(db.list_datasets().unwrap().len(), 1);
    assert!(db.find_datapoint_by_id(4).unwrap().is_some());
}
