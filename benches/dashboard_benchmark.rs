use chrono::{Duration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skill_tracker::models::{Difficulty, Goal, Priority, Skill, SkillProgress};
use skill_tracker::services::DashboardSummary;
use skill_tracker::store::ProgressMap;

fn fixture(skill_count: usize, goal_count: usize, entries_per_skill: usize) -> (Vec<Skill>, Vec<Goal>, ProgressMap) {
    let now = Utc::now();
    let priorities = [Priority::High, Priority::Medium, Priority::Low];

    let skills: Vec<Skill> = (0..skill_count)
        .map(|i| Skill {
            id: format!("skill-{}", i),
            user_id: "bench".to_string(),
            name: format!("Skill {}", i),
            category: "Bench".to_string(),
            difficulty: Difficulty::Intermediate,
            priority: priorities[i % priorities.len()],
            created_at: now - Duration::hours(i as i64),
            updated_at: now - Duration::hours(i as i64),
        })
        .collect();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let goals: Vec<Goal> = (0..goal_count)
        .map(|i| Goal {
            id: format!("goal-{}", i),
            user_id: "bench".to_string(),
            skill_id: Some(format!("skill-{}", i % skill_count.max(1))),
            title: format!("Goal {}", i),
            description: None,
            target_date: start + Duration::days((i * 7 % 365) as i64),
            completed: i % 3 == 0,
            created_at: now - Duration::minutes(i as i64 * 13),
            updated_at: now - Duration::minutes(i as i64 * 7),
        })
        .collect();

    let progress: ProgressMap = skills
        .iter()
        .map(|s| {
            let entries = (0..entries_per_skill)
                .map(|d| SkillProgress {
                    id: format!("{}-{}", s.id, d),
                    skill_id: s.id.clone(),
                    date: start + Duration::days(d as i64),
                    progress_value: (d % 101) as u8,
                    notes: None,
                })
                .collect();
            (s.id.clone(), entries)
        })
        .collect();

    (skills, goals, progress)
}

fn benchmark_dashboard_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard_summary");

    let (skills, goals, progress) = fixture(5, 3, 10);
    group.bench_function("free_plan_user", |b| {
        b.iter(|| {
            DashboardSummary::build(
                black_box(&skills),
                black_box(&goals),
                black_box(&progress),
                Utc::now(),
            )
        })
    });

    let (skills, goals, progress) = fixture(200, 500, 100);
    group.bench_function("heavy_user", |b| {
        b.iter(|| {
            DashboardSummary::build(
                black_box(&skills),
                black_box(&goals),
                black_box(&progress),
                Utc::now(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_dashboard_summary);
criterion_main!(benches);
