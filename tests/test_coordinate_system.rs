mod common;
use common::*;

#[test]
fn right_triangle_picks_corner_as_origin() -> anyhow::Result<()> {
    let cs = CoordinateSystem::from_markers(&[Point::new(0, 0), Point::new(3, 0), Point::new(0, 4)])?;
    assert_eq!(cs.origin(), Point::new(0, 0));
    assert_eq!(cs.x_axis().p2(), Point::new(3, 0));
    assert_eq!(cs.y_axis().p2(), Point::new(0, 4));
    assert_eq!(cs.x_axis().length(), 3.0);
    assert_eq!(cs.y_axis().length(), 4.0);
    Ok(())
}

#[test]
fn marker_order_does_not_matter() -> anyhow::Result<()> {
    let expected = marker_frame();
    let shuffled = [MARKERS[2], MARKERS[0], MARKERS[1]];
    let cs = CoordinateSystem::from_markers(&shuffled)?;
    assert_eq!(cs.origin(), expected.origin());
    assert_eq!(cs.x_axis().p2(), expected.x_axis().p2());
    assert_eq!(cs.y_axis().p2(), expected.y_axis().p2());
    Ok(())
}

#[test]
fn form_markers_give_horizontal_x_axis() {
    let cs = marker_frame();
    assert_eq!(cs.origin(), Point::new(40, 40));
    assert_eq!(cs.x_axis(), Line::new(Point::new(40, 40), Point::new(300, 40)));
    assert_eq!(cs.y_axis(), Line::new(Point::new(40, 40), Point::new(40, 360)));
    assert_eq!(cs.x_axis().angle(), 0.0);
}

#[test]
fn wrong_marker_count_is_rejected() {
    let two = [Point::new(0, 0), Point::new(1, 0)];
    assert!(matches!(
        CoordinateSystem::from_markers(&two),
        Err(FormError::UnsupportedGeometry(_))
    ));
    let four = [Point::new(0, 0), Point::new(1, 0), Point::new(0, 1), Point::new(1, 1)];
    assert!(matches!(
        CoordinateSystem::from_markers(&four),
        Err(FormError::UnsupportedGeometry(_))
    ));
}

#[test]
fn duplicate_markers_are_rejected() {
    let markers = [Point::new(5, 5), Point::new(5, 5), Point::new(0, 9)];
    assert!(matches!(
        CoordinateSystem::from_markers(&markers),
        Err(FormError::UnsupportedGeometry(_))
    ));
}

#[test]
fn axes_must_start_at_origin() {
    let origin = Point::new(1, 1);
    let x_axis = Line::new(origin, Point::new(10, 1));
    let detached = Line::new(Point::new(0, 0), Point::new(0, 10));
    assert!(CoordinateSystem::new(origin, x_axis, detached).is_err());
}

#[test]
fn serializes_as_endpoints() -> anyhow::Result<()> {
    let cs = marker_frame();
    let json = serde_json::to_string(&cs)?;
    assert!(!json.contains("length"));
    let back: CoordinateSystem = serde_json::from_str(&json)?;
    assert_eq!(back, cs);
    assert_eq!(back.y_axis().length(), 320.0);
    Ok(())
}
