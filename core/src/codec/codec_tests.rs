//! Tests for the lore persistence codec
//!
//! Covers apply/decode/remove semantics, lore ordering and the two
//! conflict scenarios (one-directional rules enforced both ways).

use enchantry_types::{DEFAULT_TAG_PREFIX as P, ItemKind};

use super::{Item, LineScan, LoreCodec};
use crate::enchant::{ConflictRule, EnchantmentDefinition, EnchantmentRegistry};
use crate::error::RejectReason;

fn inferno() -> EnchantmentDefinition {
    EnchantmentDefinition::new("Inferno", 3, [ItemKind::Sword])
}

/// Conflict rule declared only on Frostbite's side.
fn frostbite() -> EnchantmentDefinition {
    EnchantmentDefinition::new("Frostbite", 2, [ItemKind::Sword])
        .with_conflicts(ConflictRule::NameContains(vec!["inferno".into(), "fire".into()]))
}

fn make_registry(defs: Vec<EnchantmentDefinition>) -> EnchantmentRegistry {
    let mut registry = EnchantmentRegistry::new();
    for def in defs {
        assert!(registry.register_definition(def));
    }
    registry
}

fn sword() -> Item {
    Item::new(ItemKind::Sword)
}

fn tag(s: &str) -> String {
    format!("{P}{s}")
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn test_apply_then_decode() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let def = registry.get("Inferno").unwrap();

    let item = codec.apply(&sword(), def, 2, &registry).unwrap();

    assert_eq!(item.lore, vec![tag("Inferno II")]);
    assert_eq!(
        codec.decode(&item, &registry).levels(),
        vec![("Inferno".to_string(), 2)]
    );
}

#[test]
fn test_conflicting_enchantment_rejected() {
    let registry = make_registry(vec![inferno(), frostbite()]);
    let codec = LoreCodec::default();
    let inferno = registry.get("inferno").unwrap();
    let frost = registry.get("frostbite").unwrap();

    let item = codec.apply(&sword(), inferno, 2, &registry).unwrap();
    let result = codec.apply(&item, frost, 1, &registry);

    assert_eq!(
        result,
        Err(RejectReason::Conflict {
            with: "Inferno".into()
        })
    );
    assert_eq!(codec.apply_or_keep(&item, frost, 1, &registry), item);
    assert_eq!(
        codec.decode(&item, &registry).levels(),
        vec![("Inferno".to_string(), 2)]
    );
}

#[test]
fn test_conflict_enforced_in_reverse_order() {
    let registry = make_registry(vec![inferno(), frostbite()]);
    let codec = LoreCodec::default();
    let inferno = registry.get("inferno").unwrap();
    let frost = registry.get("frostbite").unwrap();

    // Inferno declares no rule; the rule on the existing Frostbite still applies.
    let item = codec.apply(&sword(), frost, 1, &registry).unwrap();
    assert_eq!(
        codec.apply(&item, inferno, 1, &registry),
        Err(RejectReason::Conflict {
            with: "Frostbite".into()
        })
    );
}

// ─── Apply ──────────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_every_valid_level() {
    let registry = make_registry(vec![
        inferno(),
        EnchantmentDefinition::new("Big Numbers", 40, [ItemKind::Sword]),
    ]);
    let codec = LoreCodec::default();
    for def in registry.all() {
        for level in 1..=def.max_level() {
            let item = codec.apply(&sword(), &def, level, &registry).unwrap();
            assert_eq!(codec.decode(&item, &registry).get(def.name()), Some(level));
            assert_eq!(codec.level_of(&item, &def, &registry), level);
        }
    }
}

#[test]
fn test_reapply_overwrites_level() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let def = registry.get("inferno").unwrap();

    let once = codec.apply(&sword(), def, 1, &registry).unwrap();
    let twice = codec.apply(&once, def, 3, &registry).unwrap();

    assert_eq!(twice.lore, vec![tag("Inferno III")]);
    assert_eq!(codec.decode(&twice, &registry).len(), 1);
}

#[test]
fn test_invalid_level_and_domain_rejected() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let def = registry.get("inferno").unwrap();

    assert!(matches!(
        codec.apply(&sword(), def, 0, &registry),
        Err(RejectReason::InvalidLevel { level: 0, max: 3, .. })
    ));
    assert!(matches!(
        codec.apply(&sword(), def, 4, &registry),
        Err(RejectReason::InvalidLevel { level: 4, .. })
    ));
    assert_eq!(
        codec.apply(&Item::new(ItemKind::Bow), def, 1, &registry),
        Err(RejectReason::WrongItemKind {
            name: "Inferno".into(),
            kind: ItemKind::Bow
        })
    );
}

#[test]
fn test_apply_does_not_mutate_input() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let original = Item::with_lore(ItemKind::Sword, ["Heirloom"]);
    let snapshot = original.clone();

    let _ = codec.apply(&original, registry.get("inferno").unwrap(), 1, &registry);

    assert_eq!(original, snapshot);
}

#[test]
fn test_apply_sorts_tags_above_foreign_lines() {
    let registry = make_registry(vec![
        inferno(),
        EnchantmentDefinition::new("Soul Siphon", 3, [ItemKind::Sword]),
    ]);
    let codec = LoreCodec::default();
    let item = Item::with_lore(ItemKind::Sword, ["Heirloom", "Made in the north"]);

    let item = codec
        .apply(&item, registry.get("soul siphon").unwrap(), 1, &registry)
        .unwrap();
    let item = codec
        .apply(&item, registry.get("inferno").unwrap(), 2, &registry)
        .unwrap();

    assert_eq!(
        item.lore,
        vec![
            tag("Inferno II"),
            tag("Soul Siphon I"),
            "Heirloom".to_string(),
            "Made in the north".to_string(),
        ]
    );
}

// ─── Decode ─────────────────────────────────────────────────────────────────

#[test]
fn test_decode_empty_and_unknown() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    assert!(codec.decode(&sword(), &registry).is_empty());

    let item = Item::with_lore(ItemKind::Sword, [tag("Vanished II"), tag("Inferno I")]);
    assert_eq!(
        codec.decode(&item, &registry).levels(),
        vec![("Inferno".to_string(), 1)]
    );
}

#[test]
fn test_corrupt_line_skipped_rest_decoded() {
    let registry = make_registry(vec![inferno(), frostbite()]);
    let codec = LoreCodec::default();
    let item = Item::with_lore(
        ItemKind::Sword,
        [tag("Frostbite IIII"), tag("Inferno III"), "flavor".to_string()],
    );

    let scans = codec.scan(&item, &registry);
    assert!(matches!(scans[0], LineScan::Malformed(_)));
    assert!(matches!(scans[1], LineScan::Enchantment { level: 3, .. }));
    assert_eq!(scans[2], LineScan::Foreign);
    assert_eq!(
        codec.decode(&item, &registry).levels(),
        vec![("Inferno".to_string(), 3)]
    );
}

#[test]
fn test_foreign_text_ending_in_numeral_letters_is_unknown() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let item = Item::with_lore(
        ItemKind::Sword,
        [tag("Property of CIVIC"), tag("Inferno II")],
    );

    let scans = codec.scan(&item, &registry);
    assert_eq!(
        scans[0],
        LineScan::Unknown {
            name: "Property of".into()
        }
    );
    assert!(matches!(scans[1], LineScan::Enchantment { level: 2, .. }));
}

#[test]
fn test_decode_is_case_insensitive_on_name() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let item = Item::with_lore(ItemKind::Sword, [tag("INFERNO II")]);
    assert_eq!(codec.decode(&item, &registry).get("inferno"), Some(2));
}

// ─── Remove ─────────────────────────────────────────────────────────────────

#[test]
fn test_remove_is_idempotent() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let def = registry.get("inferno").unwrap();
    let item = Item::with_lore(ItemKind::Sword, [tag("Inferno II"), "Heirloom".to_string()]);

    let once = codec.remove_or_keep(&item, def);
    let twice = codec.remove_or_keep(&once, def);

    assert_eq!(once.lore, vec!["Heirloom".to_string()]);
    assert_eq!(once, twice);
    assert!(codec.remove(&once, def).is_none());
}

#[test]
fn test_remove_leaves_similar_foreign_text() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let def = registry.get("inferno").unwrap();
    let item = Item::with_lore(
        ItemKind::Sword,
        [
            tag("Inferno II"),
            tag("Inferno of the north"),
            "Inferno II".to_string(),
        ],
    );

    let stripped = codec.remove(&item, def).unwrap();

    assert_eq!(
        stripped.lore,
        vec![tag("Inferno of the north"), "Inferno II".to_string()]
    );
}

#[test]
fn test_remove_strips_malformed_level_line() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::default();
    let item = Item::with_lore(ItemKind::Sword, [tag("Inferno IIII")]);
    let stripped = codec.remove(&item, registry.get("inferno").unwrap()).unwrap();
    assert!(stripped.lore.is_empty());
}

#[test]
fn test_custom_prefix() {
    let registry = make_registry(vec![inferno()]);
    let codec = LoreCodec::new("> ");
    let item = codec
        .apply(&sword(), registry.get("inferno").unwrap(), 1, &registry)
        .unwrap();
    assert_eq!(item.lore, vec!["> Inferno I".to_string()]);
    assert!(LoreCodec::default().decode(&item, &registry).is_empty());
}
