// Criterion benchmarks for GradMatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gradmatch::core::qualification::evaluate_rules;
use gradmatch::core::scoring::normalize_score;
use gradmatch::core::{classify_tiers, ScoreBands, TierPolicy};
use gradmatch::models::{ProgramCandidate, StructuredRequirements, Tier, UserProfile};

fn create_candidate(id: usize) -> ProgramCandidate {
    ProgramCandidate {
        school_name: format!("University {}", id),
        program_name: "MSc Data Science".to_string(),
        country: "United Kingdom".to_string(),
        ranking: if id % 7 == 0 { None } else { Some((id * 13 % 400) as u32 + 1) },
        distance: (id * 37 % 100) as f64 / 100.0,
        degree_type: Some("MSc".to_string()),
        duration: Some("1 year".to_string()),
        program_details: String::new(),
        language_text: None,
    }
}

fn create_profile() -> UserProfile {
    UserProfile {
        gpa: Some(3.5),
        toefl: Some(102.0),
        ielts: Some(7.0),
        background: vec!["Python".to_string(), "Calculus".to_string(), "Statistics".to_string()],
        degree: Some("BSc Mathematics".to_string()),
        experience: vec!["internship".to_string()],
        ..UserProfile::default()
    }
}

fn create_requirements() -> StructuredRequirements {
    StructuredRequirements {
        tuition: "£36,000".to_string(),
        gpa_requirement: "Minimum 3.3 GPA on a 4.0 scale".to_string(),
        language_requirement: "IELTS 7.0 overall or TOEFL iBT 100".to_string(),
        prerequisite_courses: "Calculus, linear algebra, statistics and programming in Python".to_string(),
        degree_requirement: "Bachelor's degree in a quantitative subject".to_string(),
        other_requirements: "Research experience recommended".to_string(),
    }
}

fn bench_classify_tiers(c: &mut Criterion) {
    let policy = TierPolicy::default();

    let mut group = c.benchmark_group("tiers");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<ProgramCandidate> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("classify_tiers", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| classify_tiers(black_box(candidates.clone()), black_box(&policy)));
            },
        );
    }

    group.finish();
}

fn bench_evaluate_rules(c: &mut Criterion) {
    let profile = create_profile();
    let requirements = create_requirements();

    c.bench_function("evaluate_rules", |b| {
        b.iter(|| evaluate_rules(black_box(&profile), black_box(&requirements)));
    });
}

fn bench_normalize_score(c: &mut Criterion) {
    let bands = ScoreBands::default();

    c.bench_function("normalize_score", |b| {
        b.iter(|| {
            for tier in [Tier::Dream, Tier::Target, Tier::Safe] {
                black_box(normalize_score(black_box(0.23), tier, &bands));
            }
        });
    });
}

criterion_group!(benches, bench_classify_tiers, bench_evaluate_rules, bench_normalize_score);

criterion_main!(benches);
