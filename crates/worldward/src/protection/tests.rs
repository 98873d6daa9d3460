//! Tests for the protection module.

use std::sync::Arc;

use crate::geometry::{BlockCuboid, BlockPos, PolygonPrism, RegionShape};
use crate::protection::{
    keys, FlagRegistry, FlagValue, ProtectionError, Region, RegionGroup, RegionManager, State,
    GLOBAL_REGION,
};

fn manager() -> RegionManager {
    RegionManager::new(Arc::new(FlagRegistry::standard()))
}

fn cuboid(name: &str, min: (i32, i32, i32), max: (i32, i32, i32)) -> Region {
    Region::new(
        name,
        RegionShape::Cuboid(BlockCuboid::new(
            BlockPos::new(min.0, min.1, min.2),
            BlockPos::new(max.0, max.1, max.2),
        )),
    )
}

fn pos(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

#[test]
fn applicable_set_is_exactly_the_containing_regions() {
    let mgr = manager();
    mgr.add(cuboid("a", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.add(cuboid("b", (5, 0, 5), (20, 10, 20))).unwrap();
    mgr.add(cuboid("far", (1000, 0, 1000), (1010, 10, 1010)))
        .unwrap();

    let set = mgr.applicable_at(pos(7, 5, 7));
    let names: Vec<String> = set.iter().map(|r| r.name.clone()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"a".to_string()));
    assert!(names.contains(&"b".to_string()));

    assert!(mgr.applicable_at(pos(500, 5, 500)).is_empty());
}

#[test]
fn insertion_order_does_not_change_the_applicable_set() {
    let forward = manager();
    forward.add(cuboid("a", (0, 0, 0), (10, 10, 10))).unwrap();
    forward.add(cuboid("b", (0, 0, 0), (10, 10, 10))).unwrap();
    let backward = manager();
    backward.add(cuboid("b", (0, 0, 0), (10, 10, 10))).unwrap();
    backward.add(cuboid("a", (0, 0, 0), (10, 10, 10))).unwrap();

    let names = |mgr: &RegionManager| -> Vec<String> {
        mgr.applicable_at(pos(5, 5, 5))
            .iter()
            .map(|r| r.name.clone())
            .collect()
    };
    assert_eq!(names(&forward), names(&backward));
}

#[test]
fn polygon_regions_resolve_by_containment() {
    let mgr = manager();
    mgr.add(Region::new(
        "tri",
        RegionShape::Polygon(PolygonPrism::new(vec![(0, 0), (40, 0), (0, 40)], 0, 128)),
    ))
    .unwrap();

    assert_eq!(mgr.applicable_at(pos(5, 64, 5)).len(), 1);
    // Inside the bounding box but outside the polygon.
    assert!(mgr.applicable_at(pos(39, 64, 39)).is_empty());
}

#[test]
fn duplicate_names_collide_case_insensitively() {
    let mgr = manager();
    mgr.add(cuboid("Spawn", (0, 0, 0), (10, 10, 10))).unwrap();
    let err = mgr.add(cuboid("SPAWN", (0, 0, 0), (10, 10, 10))).unwrap_err();
    assert!(matches!(err, ProtectionError::DuplicateName { .. }));
}

#[test]
fn remove_unknown_region_fails() {
    let mgr = manager();
    assert_eq!(
        mgr.remove("ghost"),
        Err(ProtectionError::NotFound {
            name: "ghost".to_string()
        })
    );
}

#[test]
fn remove_clears_children_parent_pointers() {
    let mgr = manager();
    mgr.add(cuboid("outer", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("inner", (10, 0, 10), (20, 100, 20))).unwrap();
    mgr.set_parent("inner", Some("outer")).unwrap();
    assert_eq!(mgr.get("inner").unwrap().parent.as_deref(), Some("outer"));

    mgr.remove("outer").unwrap();
    assert_eq!(mgr.get("inner").unwrap().parent, None);
}

#[test]
fn parent_cycles_are_rejected_and_leave_parent_unchanged() {
    let mgr = manager();
    mgr.add(cuboid("a", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.add(cuboid("b", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.add(cuboid("c", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.set_parent("b", Some("a")).unwrap();
    mgr.set_parent("c", Some("b")).unwrap();

    // Self-parent and ancestor-parent both fail.
    assert!(matches!(
        mgr.set_parent("a", Some("a")),
        Err(ProtectionError::ParentCycle { .. })
    ));
    assert!(matches!(
        mgr.set_parent("a", Some("c")),
        Err(ProtectionError::ParentCycle { .. })
    ));
    assert_eq!(mgr.get("a").unwrap().parent, None);
    assert_eq!(mgr.get("c").unwrap().parent.as_deref(), Some("b"));
}

#[test]
fn priority_monotonicity_beats_ancestry() {
    let mgr = manager();
    mgr.add(cuboid("parent", (0, 0, 0), (50, 50, 50)).with_priority(20))
        .unwrap();
    mgr.add(cuboid("child", (10, 0, 10), (20, 50, 20)).with_priority(5))
        .unwrap();
    mgr.set_parent("child", Some("parent")).unwrap();
    mgr.set_flag("parent", keys::FIRE_SPREAD, None, FlagValue::State(State::Deny))
        .unwrap();
    mgr.set_flag("child", keys::FIRE_SPREAD, None, FlagValue::State(State::Allow))
        .unwrap();

    // The higher-priority ancestor wins even against its own descendant.
    let set = mgr.applicable_at(pos(15, 25, 15));
    assert_eq!(set.allows(keys::FIRE_SPREAD, None), Ok(false));
}

#[test]
fn child_overrides_parent_at_equal_priority() {
    let mgr = manager();
    mgr.add(cuboid("town", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("plot", (10, 0, 10), (20, 100, 20))).unwrap();
    mgr.set_parent("plot", Some("town")).unwrap();
    mgr.set_flag("plot", keys::LEAF_DECAY, None, FlagValue::State(State::Deny))
        .unwrap();

    // Inside the child the child's value applies.
    let inside = mgr.applicable_at(pos(15, 50, 15));
    assert_eq!(inside.allows(keys::LEAF_DECAY, None), Ok(false));

    // Inside the parent but outside the child, the parent leaves the flag
    // unset, so the default applies.
    let outside = mgr.applicable_at(pos(50, 50, 50));
    assert_eq!(outside.allows(keys::LEAF_DECAY, None), Ok(true));
}

#[test]
fn child_override_beats_parent_past_an_unrelated_sibling() {
    let mgr = manager();
    mgr.add(cuboid("estate", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("market", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("plot", (10, 0, 10), (20, 100, 20))).unwrap();
    mgr.set_parent("plot", Some("estate")).unwrap();
    mgr.set_flag("estate", keys::FIRE_SPREAD, None, FlagValue::State(State::Allow))
        .unwrap();
    mgr.set_flag("plot", keys::FIRE_SPREAD, None, FlagValue::State(State::Deny))
        .unwrap();

    // All three cover the point at equal priority, and by name the unrelated
    // sibling sits between parent and child. The child's explicit value still
    // decides before its parent's.
    let set = mgr.applicable_at(pos(15, 50, 15));
    assert_eq!(set.allows(keys::FIRE_SPREAD, None), Ok(false));
}

#[test]
fn parent_value_applies_when_child_is_unset() {
    let mgr = manager();
    mgr.add(cuboid("town", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("plot", (10, 0, 10), (20, 100, 20))).unwrap();
    mgr.set_parent("plot", Some("town")).unwrap();
    mgr.set_flag("town", keys::PISTONS, None, FlagValue::State(State::Deny))
        .unwrap();

    let set = mgr.applicable_at(pos(15, 50, 15));
    assert_eq!(set.allows(keys::PISTONS, None), Ok(false));
}

#[test]
fn flags_inherit_from_a_template_parent_elsewhere() {
    // A parent used purely as a flag template; its shape never overlaps the
    // child.
    let mgr = manager();
    mgr.add(cuboid("template", (1000, 0, 1000), (1001, 1, 1001))).unwrap();
    mgr.add(cuboid("plot-1", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.set_parent("plot-1", Some("template")).unwrap();
    mgr.set_flag("template", keys::MUSHROOMS, None, FlagValue::State(State::Deny))
        .unwrap();

    let set = mgr.applicable_at(pos(5, 5, 5));
    assert_eq!(set.allows(keys::MUSHROOMS, None), Ok(false));
}

#[test]
fn higher_priority_region_wins_overlap() {
    let mgr = manager();
    mgr.add(cuboid("town", (0, 0, 0), (100, 100, 100)).with_priority(5))
        .unwrap();
    mgr.add(cuboid("vault", (40, 0, 40), (60, 100, 60)).with_priority(20))
        .unwrap();
    mgr.set_flag("town", keys::FIRE_SPREAD, None, FlagValue::State(State::Allow))
        .unwrap();
    mgr.set_flag("vault", keys::FIRE_SPREAD, None, FlagValue::State(State::Deny))
        .unwrap();

    let set = mgr.applicable_at(pos(50, 50, 50));
    assert_eq!(set.allows(keys::FIRE_SPREAD, None), Ok(false));
}

#[test]
fn build_membership_scenario() {
    let mgr = manager();
    mgr.add(cuboid("shop", (0, 0, 0), (30, 30, 30)).with_priority(10))
        .unwrap();
    mgr.set_flag(
        "shop",
        keys::BUILD,
        Some(RegionGroup::NonMembers),
        FlagValue::State(State::Deny),
    )
    .unwrap();

    let actor = "bob".to_string();
    assert!(!mgr.applicable_at(pos(5, 5, 5)).can_build(Some(&actor)));

    mgr.add_member("shop", actor.clone()).unwrap();
    assert!(mgr.applicable_at(pos(5, 5, 5)).can_build(Some(&actor)));
}

#[test]
fn membership_is_inherited_from_ancestors() {
    let mgr = manager();
    mgr.add(cuboid("estate", (0, 0, 0), (100, 100, 100))).unwrap();
    mgr.add(cuboid("cottage", (10, 0, 10), (20, 100, 20))).unwrap();
    mgr.set_parent("cottage", Some("estate")).unwrap();
    mgr.set_flag(
        "cottage",
        keys::BUILD,
        Some(RegionGroup::NonMembers),
        FlagValue::State(State::Deny),
    )
    .unwrap();
    mgr.add_owner("estate", "alice".to_string()).unwrap();

    let alice = "alice".to_string();
    let bob = "bob".to_string();
    let set = mgr.applicable_at(pos(15, 50, 15));
    assert!(set.can_build(Some(&alice)));
    assert!(!set.can_build(Some(&bob)));
}

#[test]
fn absent_actor_is_a_non_member() {
    let mgr = manager();
    mgr.add(cuboid("keep", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.set_flag(
        "keep",
        keys::BUILD,
        Some(RegionGroup::NonMembers),
        FlagValue::State(State::Deny),
    )
    .unwrap();

    assert!(!mgr.applicable_at(pos(5, 5, 5)).can_build(None));
}

#[test]
fn uncovered_point_falls_through_to_defaults() {
    let mgr = manager();
    let set = mgr.applicable_at(pos(0, 0, 0));
    assert!(set.can_build(Some(&"anyone".to_string())));
    assert!(set.can_build(None));
    assert_eq!(set.allows(keys::WATER_FLOW, None), Ok(true));
}

#[test]
fn global_region_supplies_world_defaults() {
    let mgr = manager();
    mgr.set_flag(GLOBAL_REGION, keys::LIGHTNING, None, FlagValue::State(State::Deny))
        .unwrap();
    mgr.add(cuboid("arena", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.set_flag("arena", keys::LIGHTNING, None, FlagValue::State(State::Allow))
        .unwrap();

    // Outside any region the global value decides.
    assert_eq!(
        mgr.applicable_at(pos(500, 5, 500)).allows(keys::LIGHTNING, None),
        Ok(false)
    );
    // Any overlapping region decides before the global region.
    assert_eq!(
        mgr.applicable_at(pos(5, 5, 5)).allows(keys::LIGHTNING, None),
        Ok(true)
    );
}

#[test]
fn unknown_flag_queries_fail() {
    let mgr = manager();
    let set = mgr.applicable_at(pos(0, 0, 0));
    assert!(matches!(
        set.allows("no-such-flag", None),
        Err(ProtectionError::UnknownFlag { .. })
    ));
    assert!(matches!(
        mgr.set_flag("x", "no-such-flag", None, FlagValue::State(State::Deny)),
        Err(ProtectionError::UnknownFlag { .. })
    ));
}

#[test]
fn flag_kind_is_checked_on_write_and_state_query() {
    let mgr = manager();
    mgr.add(cuboid("inn", (0, 0, 0), (10, 10, 10))).unwrap();
    assert!(matches!(
        mgr.set_flag("inn", keys::GREETING, None, FlagValue::State(State::Allow)),
        Err(ProtectionError::FlagKindMismatch { .. })
    ));
    let set = mgr.applicable_at(pos(5, 5, 5));
    assert!(matches!(
        set.allows(keys::GREETING, None),
        Err(ProtectionError::FlagKindMismatch { .. })
    ));
}

#[test]
fn text_flags_resolve_through_priority() {
    let mgr = manager();
    mgr.add(cuboid("town", (0, 0, 0), (100, 100, 100)).with_priority(1))
        .unwrap();
    mgr.add(cuboid("inn", (10, 0, 10), (20, 100, 20)).with_priority(9))
        .unwrap();
    mgr.set_flag("town", keys::GREETING, None, FlagValue::Text("welcome to town".into()))
        .unwrap();
    mgr.set_flag("inn", keys::GREETING, None, FlagValue::Text("welcome to the inn".into()))
        .unwrap();

    let set = mgr.applicable_at(pos(15, 50, 15));
    assert_eq!(
        set.resolve(keys::GREETING, None),
        Ok(Some(FlagValue::Text("welcome to the inn".into())))
    );
    // Text flags have no default; uncovered points resolve to nothing.
    assert_eq!(mgr.applicable_at(pos(500, 0, 500)).resolve(keys::GREETING, None), Ok(None));
}

#[test]
fn construct_requires_membership_where_regions_exist() {
    let mgr = manager();
    mgr.add(cuboid("site", (0, 0, 0), (30, 30, 30))).unwrap();
    mgr.add_member("site", "mason".to_string()).unwrap();

    let mason = "mason".to_string();
    let visitor = "visitor".to_string();
    let set = mgr.applicable_at(pos(5, 5, 5));
    assert!(set.can_construct(Some(&mason)));
    assert!(!set.can_construct(Some(&visitor)));
    assert!(!set.can_construct(None));

    // Uncovered points are unrestricted.
    assert!(mgr.applicable_at(pos(500, 0, 500)).can_construct(Some(&visitor)));
}

#[test]
fn explicit_construct_group_overrides_the_default() {
    let mgr = manager();
    mgr.add(cuboid("commons", (0, 0, 0), (30, 30, 30))).unwrap();
    mgr.set_flag(
        "commons",
        keys::CONSTRUCT,
        None,
        FlagValue::Group(RegionGroup::All),
    )
    .unwrap();

    assert!(mgr
        .applicable_at(pos(5, 5, 5))
        .can_construct(Some(&"visitor".to_string())));
}

#[test]
fn group_scoped_flag_uses_membership_in_the_deciding_region() {
    let mgr = manager();
    mgr.add(cuboid("camp", (0, 0, 0), (30, 30, 30))).unwrap();
    mgr.add_member("camp", "scout".to_string()).unwrap();
    mgr.set_flag(
        "camp",
        keys::LIGHTER,
        Some(RegionGroup::Members),
        FlagValue::State(State::Allow),
    )
    .unwrap();
    mgr.set_flag(
        "camp",
        keys::LIGHTER,
        Some(RegionGroup::NonMembers),
        FlagValue::State(State::Deny),
    )
    .unwrap();

    let set = mgr.applicable_at(pos(5, 5, 5));
    assert_eq!(set.allows(keys::LIGHTER, Some(&"scout".to_string())), Ok(true));
    assert_eq!(set.allows(keys::LIGHTER, Some(&"stranger".to_string())), Ok(false));
    assert_eq!(set.allows(keys::LIGHTER, None), Ok(false));
}

#[test]
fn volume_query_unions_all_intersecting_regions() {
    let mgr = manager();
    mgr.add(cuboid("left", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.add(cuboid("right", (50, 0, 0), (60, 10, 10))).unwrap();
    mgr.add(cuboid("far", (500, 0, 0), (510, 10, 10))).unwrap();

    // A piston row crossing both nearby regions but not the far one.
    let volume = BlockCuboid::new(pos(8, 5, 5), pos(55, 5, 5));
    let set = mgr.applicable_in(&volume);
    let names: Vec<String> = set.iter().map(|r| r.name.clone()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"left".to_string()));
    assert!(names.contains(&"right".to_string()));
}

#[test]
fn queries_are_idempotent_for_unchanged_state() {
    let mgr = manager();
    mgr.add(cuboid("vault", (0, 0, 0), (10, 10, 10)).with_priority(20))
        .unwrap();
    mgr.set_flag("vault", keys::FIRE_SPREAD, None, FlagValue::State(State::Deny))
        .unwrap();

    let first = mgr.applicable_at(pos(5, 5, 5)).allows(keys::FIRE_SPREAD, None);
    let second = mgr.applicable_at(pos(5, 5, 5)).allows(keys::FIRE_SPREAD, None);
    assert_eq!(first, second);
}

#[test]
fn equal_priority_unrelated_regions_order_deterministically() {
    let mgr = manager();
    mgr.add(cuboid("beta", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.add(cuboid("alpha", (0, 0, 0), (10, 10, 10))).unwrap();
    mgr.set_flag("alpha", keys::SNOW_FALL, None, FlagValue::State(State::Deny))
        .unwrap();
    mgr.set_flag("beta", keys::SNOW_FALL, None, FlagValue::State(State::Allow))
        .unwrap();

    // Name order breaks the tie, so "alpha" decides, every time.
    for _ in 0..3 {
        let set = mgr.applicable_at(pos(5, 5, 5));
        assert_eq!(set.allows(keys::SNOW_FALL, None), Ok(false));
    }
}

#[test]
fn mutations_keep_the_index_consistent() {
    let mgr = manager();
    mgr.add(cuboid("a", (0, 0, 0), (10, 10, 10))).unwrap();
    assert_eq!(mgr.applicable_at(pos(5, 5, 5)).len(), 1);

    mgr.remove("a").unwrap();
    assert!(mgr.applicable_at(pos(5, 5, 5)).is_empty());
    assert!(mgr.is_empty());
}
