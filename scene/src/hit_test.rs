use super::*;
use crate::factory::ModelFactory;
use crate::schema::ElementSchema;

fn model() -> Model {
    let mut outer = ElementSchema::shape("outer", "node", Bounds::new(0.0, 0.0, 100.0, 100.0));
    outer.children = vec![ElementSchema::shape("port", "port", Bounds::new(90.0, 40.0, 10.0, 10.0))];
    let schema = ElementSchema::new("g", "graph").with_children(vec![
        outer,
        ElementSchema::shape("other", "node", Bounds::new(200.0, 0.0, 50.0, 50.0)),
        ElementSchema::edge("e", "outer", "other"),
    ]);
    ModelFactory::new().create_root(&schema).expect("model")
}

#[test]
fn deepest_connectable_wins() {
    let model = model();
    assert_eq!(connectable_at(&model, Point::new(95.0, 45.0), &[]).as_deref(), Some("port"));
    assert_eq!(connectable_at(&model, Point::new(10.0, 10.0), &[]).as_deref(), Some("outer"));
}

#[test]
fn excluded_ids_are_skipped() {
    let model = model();
    assert_eq!(connectable_at(&model, Point::new(95.0, 45.0), &["port"]).as_deref(), Some("outer"));
}

#[test]
fn empty_space_misses() {
    let model = model();
    assert!(connectable_at(&model, Point::new(150.0, 10.0), &[]).is_none());
}

#[test]
fn element_at_respects_filter() {
    let model = model();
    let hit = element_at(&model, Point::new(220.0, 20.0), |e| e.basic() == BasicType::Node);
    assert_eq!(hit.as_deref(), Some("other"));
}
