use bubble_merge_core::{
    AssetId, BubbleType, CellCoord, Command, Event, GridLayout, PlacementError, Tier,
};
use bubble_merge_system_merge::{CascadePotential, MergeResolver};
use bubble_merge_system_placement::{PlacementRequest, PlacementResolver};
use bubble_merge_world::{apply, query, World};

const GEYSER: BubbleType = BubbleType::new(21);

fn world(rows: u32, columns: u32) -> World {
    World::with_layout(&GridLayout::new(rows, columns, 32.0))
}

fn place(world: &mut World, tier: Tier, bubble_type: BubbleType, anchor: (i32, i32)) -> AssetId {
    let mut events = Vec::new();
    apply(
        world,
        Command::PlaceAsset {
            tier,
            bubble_type,
            anchor: CellCoord::new(anchor.0, anchor.1),
            evict: Vec::new(),
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::AssetPlaced { asset, .. } => Some(*asset),
            _ => None,
        })
        .unwrap_or_else(|| panic!("placement at {anchor:?} failed: {events:?}"))
}

fn resolve(
    world: &World,
    request: PlacementRequest,
) -> Result<bubble_merge_system_placement::PlacementPlan, PlacementError> {
    let mut placement = PlacementResolver::default();
    let mut merges = MergeResolver::default();
    placement.resolve(&query::grid_view(world), &request, &mut merges)
}

#[test]
fn free_preferred_anchor_is_taken_directly() {
    let world = world(10, 10);
    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Basic, BubbleType::FIRE, CellCoord::new(4, 4)),
    )
    .expect("empty grid accepts the shot");

    assert!(plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(4, 4));
    assert!(plan.evict().is_empty());
    assert_eq!(plan.footprint(), &[CellCoord::new(4, 4)]);
}

#[test]
fn occupied_anchor_moves_to_the_nearest_free_ring_cell() {
    let mut world = world(10, 10);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 5));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Basic, BubbleType::WATER, CellCoord::new(5, 5)),
    )
    .expect("ring one has room");
    assert!(!plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(4, 5), "lower row wins the tie");

    let toward_origin = resolve(
        &world,
        PlacementRequest::new(Tier::Basic, BubbleType::WATER, CellCoord::new(5, 5))
            .with_origin(CellCoord::new(6, 5)),
    )
    .expect("ring one has room");
    assert_eq!(toward_origin.anchor(), CellCoord::new(6, 5));
}

#[test]
fn cascade_potential_outranks_position() {
    let mut world = world(10, 10);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 1));
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 2));
    let _ = place(&mut world, Tier::Basic, BubbleType::EARTH, (4, 3));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Basic, BubbleType::FIRE, CellCoord::new(4, 3)),
    )
    .expect("ring one has room");
    assert_eq!(plan.cascade().potential(), CascadePotential::BasicMerge);
    assert_eq!(plan.anchor(), CellCoord::new(4, 2));
}

#[test]
fn tier3_crossing_the_right_edge_is_rejected() {
    let world = world(12, 10);
    let request = PlacementRequest::new(Tier::Tier3, GEYSER, CellCoord::new(6, 8));

    let plan = resolve(&world, request).expect("search finds an on-screen anchor");
    assert_eq!(plan.anchor(), CellCoord::new(6, 7));
    assert_eq!(plan.footprint().len(), 19);
    assert!(plan
        .footprint()
        .iter()
        .all(|cell| query::layout(&world).contains(*cell)));

    assert_eq!(
        resolve(&world, request.with_max_distance(0)),
        Err(PlacementError::NoLegalCandidate)
    );
}

#[test]
fn stomping_follows_tier_policy() {
    let mut world = world(12, 12);
    let steam = place(&mut world, Tier::Tier2, BubbleType::STEAM, (6, 5));
    let steam_cells = query::asset(&world, steam)
        .expect("steam exists")
        .footprint()
        .to_vec();

    let flame = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::FLAME, CellCoord::new(6, 5)),
    )
    .expect("tier1 finds room around the tier2");
    assert!(flame.evict().is_empty(), "tier1 never stomps tier2");
    assert!(flame
        .footprint()
        .iter()
        .all(|cell| !steam_cells.contains(cell)));

    assert_eq!(
        resolve(
            &world,
            PlacementRequest::new(Tier::Tier2, BubbleType::new(15), CellCoord::new(6, 5))
                .with_max_distance(0),
        ),
        Err(PlacementError::NoLegalCandidate),
        "tier2 may not stomp tier2"
    );

    let geyser = resolve(
        &world,
        PlacementRequest::new(Tier::Tier3, GEYSER, CellCoord::new(6, 5)),
    )
    .expect("tier3 stomps the tier2");
    assert!(geyser.is_direct());
    assert_eq!(geyser.evict(), &[steam]);
}

#[test]
fn tier2_stomps_tier1_and_the_world_accepts_the_plan() {
    let mut world = world(12, 12);
    let flame = place(&mut world, Tier::Tier1, BubbleType::FLAME, (6, 5));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier2, BubbleType::STEAM, CellCoord::new(6, 5)),
    )
    .expect("tier2 stomps tier1");
    assert!(plan.is_direct());
    assert_eq!(plan.evict(), &[flame]);

    let mut events = Vec::new();
    apply(&mut world, plan.into_command(), &mut events);
    assert!(matches!(
        events.as_slice(),
        [Event::AssetEvicted { .. }, Event::AssetPlaced { .. }]
    ));
    assert!(query::ownership_violations(&world).is_empty());
}

#[test]
fn tier1_avoids_floating_anchors() {
    let mut world = world(12, 12);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 2));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::FLAME, CellCoord::new(2, 2)),
    )
    .expect("a grounded anchor exists within two rings");
    assert!(!plan.is_direct(), "the preferred anchor floats");
    assert_eq!(plan.anchor(), CellCoord::new(3, 2));
}

#[test]
fn tier1_resting_on_the_bottom_edge_is_grounded() {
    let world = world(8, 8);
    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::RAIN, CellCoord::new(6, 3)),
    )
    .expect("bottom rows are supported by the edge");
    assert!(plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(6, 3));
}

#[test]
fn tier1_at_the_left_edge_rests_on_the_bottom_row() {
    let world = world(8, 8);
    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::SPARK, CellCoord::new(6, 0)),
    )
    .expect("bottom-left corner is supported");
    assert!(plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(6, 0));
}

#[test]
fn side_edge_does_not_hold_up_a_tier1() {
    let world = world(12, 12);
    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::FLAME, CellCoord::new(3, 9)),
    )
    .expect("a floating anchor is still legal");
    assert_eq!(
        plan.footprint(),
        &[
            CellCoord::new(3, 9),
            CellCoord::new(3, 10),
            CellCoord::new(4, 10),
            CellCoord::new(4, 11),
        ]
    );
    assert!(
        !plan.is_direct(),
        "the cell past the end of row 5 is not ground"
    );
}

#[test]
fn tier1_drifts_from_the_right_edge_to_grounded_cells() {
    let mut world = world(12, 12);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 8));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::FLAME, CellCoord::new(3, 9)),
    )
    .expect("a grounded anchor exists one ring away");
    assert!(!plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(3, 8));
}

#[test]
fn tier1_at_the_right_edge_rests_on_an_occupant() {
    let mut world = world(12, 12);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (5, 10));

    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Tier1, BubbleType::FLAME, CellCoord::new(3, 9)),
    )
    .expect("the fire below supports the flame");
    assert!(plan.is_direct());
    assert_eq!(plan.anchor(), CellCoord::new(3, 9));
}

#[test]
fn permanent_cells_are_never_used() {
    let world = World::with_layout(
        &GridLayout::new(10, 10, 32.0).with_permanent(vec![CellCoord::new(4, 4)]),
    );
    let plan = resolve(
        &world,
        PlacementRequest::new(Tier::Basic, BubbleType::AIR, CellCoord::new(4, 4)),
    )
    .expect("neighbours are free");
    assert_ne!(plan.anchor(), CellCoord::new(4, 4));
}

#[test]
fn full_grid_reports_no_candidate() {
    let mut world = world(2, 2);
    let _ = place(&mut world, Tier::Basic, BubbleType::FIRE, (0, 0));
    let _ = place(&mut world, Tier::Basic, BubbleType::WATER, (0, 1));
    let _ = place(&mut world, Tier::Basic, BubbleType::EARTH, (1, 0));

    assert_eq!(
        resolve(
            &world,
            PlacementRequest::new(Tier::Basic, BubbleType::FIRE, CellCoord::new(0, 0)),
        ),
        Err(PlacementError::NoLegalCandidate)
    );
}

#[test]
fn mismatched_tier_is_rejected_before_searching() {
    let world = world(6, 6);
    assert_eq!(
        resolve(
            &world,
            PlacementRequest::new(Tier::Tier2, BubbleType::FLAME, CellCoord::new(3, 3)),
        ),
        Err(PlacementError::TierMismatch)
    );
}
