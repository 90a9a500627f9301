//! Predicate evaluation tests.
//!
//! Every criterion is checked against `OwnedRead` records, including the
//! `opposite` inversion, combined filters and reference-name resolution.

use bametric_common::filter::{
    BoolOperator, Criterion, Filter, FilterError, Nucleotide, ReferenceSelector, SamFlags,
    TagName, TagValue,
};
use bametric_common::read::OwnedRead;

fn no_refs() -> Vec<String> {
    Vec::new()
}

fn tag(name: &str) -> TagName {
    name.parse().unwrap()
}

fn passes(filter: &Filter, read: &OwnedRead) -> bool {
    filter.compile(&no_refs()).unwrap().evaluate(read)
}

fn build(criterion: Criterion) -> Filter {
    Filter::new("f", false, criterion).unwrap()
}

fn inverted(criterion: Criterion) -> Filter {
    Filter::new("f", true, criterion).unwrap()
}

fn nucleotide(position: i64, nucleotide: Nucleotide, n_is_wildcard: bool) -> Criterion {
    Criterion::Nucleotide {
        position,
        nucleotide,
        n_is_wildcard,
    }
}

// ─── Length ─────────────────────────────────────────────────────────

#[test]
fn length_bounds_are_inclusive() {
    let filter = build(Criterion::Length { min_len: 3, max_len: 5 });
    assert!(!passes(&filter, &OwnedRead::with_sequence("AC")));
    assert!(passes(&filter, &OwnedRead::with_sequence("ACG")));
    assert!(passes(&filter, &OwnedRead::with_sequence("ACGTA")));
    assert!(!passes(&filter, &OwnedRead::with_sequence("ACGTAC")));
}

#[test]
fn opposite_inverts_length() {
    let filter = inverted(Criterion::Length { min_len: 3, max_len: 5 });
    assert!(passes(&filter, &OwnedRead::with_sequence("AC")));
    assert!(!passes(&filter, &OwnedRead::with_sequence("ACGT")));
}

// ─── Mapping quality ────────────────────────────────────────────────

#[test]
fn mapq_range() {
    let filter = build(Criterion::Mapq { min_mapq: 20, max_mapq: 60 });
    assert!(passes(&filter, &OwnedRead::with_sequence("A").mapped(0, 20)));
    assert!(passes(&filter, &OwnedRead::with_sequence("A").mapped(0, 60)));
    assert!(!passes(&filter, &OwnedRead::with_sequence("A").mapped(0, 19)));
    // 255 means "unavailable" and is compared as-is.
    assert!(!passes(&filter, &OwnedRead::with_sequence("A")));
}

// ─── Reference ──────────────────────────────────────────────────────

#[test]
fn reference_by_id() {
    let filter = build(Criterion::Reference {
        reference: ReferenceSelector::Id(1),
    });
    assert!(passes(&filter, &OwnedRead::with_sequence("A").mapped(1, 30)));
    assert!(!passes(&filter, &OwnedRead::with_sequence("A").mapped(0, 30)));
    assert!(!passes(&filter, &OwnedRead::with_sequence("A")));
}

#[test]
fn reference_by_name_is_resolved_per_header() {
    let filter = build(Criterion::Reference {
        reference: ReferenceSelector::Name("chr2".to_string()),
    });
    let read = OwnedRead::with_sequence("A").mapped(1, 30);

    let header_a = vec!["chr1".to_string(), "chr2".to_string()];
    assert!(filter.compile(&header_a).unwrap().evaluate(&read));

    let header_b = vec!["chr2".to_string(), "chr1".to_string()];
    assert!(!filter.compile(&header_b).unwrap().evaluate(&read));
}

#[test]
fn unknown_reference_name_fails_to_compile() {
    let filter = build(Criterion::Reference {
        reference: ReferenceSelector::Name("chrZ".to_string()),
    });
    let header = vec!["chr1".to_string()];
    assert_eq!(
        filter.compile(&header).unwrap_err(),
        FilterError::UnknownReference("chrZ".to_string())
    );
}

// ─── Tags ───────────────────────────────────────────────────────────

#[test]
fn tag_value_must_match() {
    let filter = build(Criterion::Tag {
        tag: tag("NM"),
        value: TagValue::Int(0),
    });
    let exact = OwnedRead::with_sequence("A").with_tag(tag("NM"), TagValue::Int(0));
    let other = OwnedRead::with_sequence("A").with_tag(tag("NM"), TagValue::Int(2));
    let missing = OwnedRead::with_sequence("A");

    assert!(passes(&filter, &exact));
    assert!(!passes(&filter, &other));
    assert!(!passes(&filter, &missing));
}

#[test]
fn tag_types_do_not_cross_match() {
    let filter = build(Criterion::Tag {
        tag: tag("XA"),
        value: TagValue::String("A".to_string()),
    });
    let char_tag = OwnedRead::with_sequence("A").with_tag(tag("XA"), TagValue::Char('A'));
    assert!(!passes(&filter, &char_tag));
}

#[test]
fn missing_tag_with_opposite_passes() {
    let filter = inverted(Criterion::Tag {
        tag: tag("RG"),
        value: TagValue::String("lib1".to_string()),
    });
    assert!(passes(&filter, &OwnedRead::with_sequence("A")));
}

// ─── Nucleotide ─────────────────────────────────────────────────────

#[test]
fn nucleotide_from_start() {
    let read = OwnedRead::with_sequence("GATTACA");
    assert!(passes(&build(nucleotide(0, Nucleotide::G, false)), &read));
    assert!(passes(&build(nucleotide(3, Nucleotide::T, false)), &read));
    assert!(!passes(&build(nucleotide(1, Nucleotide::G, false)), &read));
}

#[test]
fn nucleotide_from_end() {
    let read = OwnedRead::with_sequence("GATTACA");
    assert!(passes(&build(nucleotide(-1, Nucleotide::A, false)), &read));
    assert!(passes(&build(nucleotide(-2, Nucleotide::C, false)), &read));
    assert!(passes(&build(nucleotide(-7, Nucleotide::G, false)), &read));
}

#[test]
fn nucleotide_out_of_range_fails() {
    let read = OwnedRead::with_sequence("GAT");
    assert!(!passes(&build(nucleotide(3, Nucleotide::G, false)), &read));
    assert!(!passes(&build(nucleotide(-4, Nucleotide::G, false)), &read));
    // Still false before inversion, so opposite keeps it.
    assert!(passes(&inverted(nucleotide(3, Nucleotide::G, false)), &read));
}

#[test]
fn nucleotide_missing_sequence_fails() {
    let read = OwnedRead::default();
    assert!(!passes(&build(nucleotide(0, Nucleotide::N, true)), &read));
}

#[test]
fn nucleotide_wildcard() {
    let read = OwnedRead::with_sequence("NAC");
    assert!(passes(&build(nucleotide(0, Nucleotide::G, true)), &read));
    assert!(!passes(&build(nucleotide(0, Nucleotide::G, false)), &read));
    assert!(passes(&build(nucleotide(0, Nucleotide::N, false)), &read));
    // Wildcard applies to N in the read only.
    assert!(!passes(&build(nucleotide(1, Nucleotide::G, true)), &read));
}

#[test]
fn nucleotide_lowercase_bases() {
    let read = OwnedRead::with_sequence("gatc");
    assert!(passes(&build(nucleotide(0, Nucleotide::G, false)), &read));
}

// ─── Flags ──────────────────────────────────────────────────────────

#[test]
fn flag_removes_any_matching_bit() {
    let filter = build(Criterion::Flag {
        remove_flags: SamFlags::DUPLICATE | SamFlags::SECONDARY,
    });
    let clean = OwnedRead::with_sequence("A").mapped(0, 60);
    let dup = clean.clone().with_flags(SamFlags::DUPLICATE | SamFlags::PAIRED);
    let secondary = clean.clone().with_flags(SamFlags::SECONDARY);

    assert!(passes(&filter, &clean));
    assert!(!passes(&filter, &dup));
    assert!(!passes(&filter, &secondary));
}

// ─── Combined ───────────────────────────────────────────────────────

fn long_reads() -> Filter {
    Filter::new("long", false, Criterion::Length { min_len: 4, max_len: 100 }).unwrap()
}

fn starts_with_g() -> Filter {
    Filter::new("g_start", false, nucleotide(0, Nucleotide::G, false)).unwrap()
}

#[test]
fn combined_follows_operator() {
    let reads = [
        (OwnedRead::with_sequence("AC"), false, false),
        (OwnedRead::with_sequence("GC"), false, true),
        (OwnedRead::with_sequence("ACGT"), true, false),
        (OwnedRead::with_sequence("GCGT"), true, true),
    ];

    for op in BoolOperator::ALL {
        let combined = Filter::combine("c", long_reads(), op, starts_with_g(), false).unwrap();
        let predicate = combined.compile(&no_refs()).unwrap();
        for (read, left, right) in &reads {
            assert_eq!(
                predicate.evaluate(read),
                op.apply(*left, *right),
                "{op} on {:?}",
                read.sequence
            );
        }
    }
}

#[test]
fn combined_respects_operand_opposite() {
    let mut short = long_reads();
    short.opposite = true;
    let combined = Filter::combine("c", short, BoolOperator::And, starts_with_g(), false).unwrap();

    assert!(passes(&combined, &OwnedRead::with_sequence("GC")));
    assert!(!passes(&combined, &OwnedRead::with_sequence("GCGT")));
}

#[test]
fn combined_opposite_inverts_result() {
    let combined =
        Filter::combine("c", long_reads(), BoolOperator::Or, starts_with_g(), true).unwrap();
    assert!(passes(&combined, &OwnedRead::with_sequence("AC")));
    assert!(!passes(&combined, &OwnedRead::with_sequence("GC")));
}

#[test]
fn nested_unknown_reference_fails() {
    let chr = Filter::new(
        "chr",
        false,
        Criterion::Reference {
            reference: ReferenceSelector::Name("chrQ".to_string()),
        },
    )
    .unwrap();
    let inner = Filter::combine("inner", long_reads(), BoolOperator::And, chr, false).unwrap();
    let outer = Filter::combine("outer", starts_with_g(), BoolOperator::Or, inner, false).unwrap();

    assert!(matches!(
        outer.compile(&no_refs()),
        Err(FilterError::UnknownReference(name)) if name == "chrQ"
    ));
}
