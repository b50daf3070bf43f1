use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use coachlink::db::{coaches, get_db_pool, DatabaseConfig};
use coachlink::models::SkillLevel;
use coachlink::services::catalogue::coaches_by_min_levels;
use coachlink::services::geocoding::{describe_location, NominatimGeocoder};
use coachlink::services::matching::rank_scored;
use coachlink::utils::{config::Config, init_logging};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct RankedCoach {
    rank: usize,
    coach_id: i32,
    name: String,
    place: Option<String>,
    distance_km: f64,
    matched_skills: usize,
    score: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("rank-coaches")
        .about("Rank coaches by distance and skill overlap for a member query")
        .arg(
            Arg::new("location")
                .long("location")
                .short('l')
                .help("Requester position: \"<lat>,<lng>\" or \"Latitude: <lat>, Longitude: <lng>\"")
                .required(true),
        )
        .arg(
            Arg::new("skills")
                .long("skills")
                .short('s')
                .help("Comma separated skill ids")
                .value_delimiter(',')
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("skill-names")
                .long("skill-names")
                .help("Comma separated skill titles, resolved against the skills table")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("min-level")
                .long("min-level")
                .help("Minimum level for the requested skills: one level for all, or one per skill in order")
                .value_delimiter(',')
                .value_parser(|raw: &str| raw.parse::<SkillLevel>()),
        )
        .arg(
            Arg::new("coach")
                .long("coach")
                .short('c')
                .help("Score a single coach instead of the whole catalogue")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .short('n')
                .help("Only print the best N coaches")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("describe")
                .long("describe")
                .help("Reverse geocode each coach's position to a place name")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let location = matches
        .get_one::<String>("location")
        .cloned()
        .unwrap_or_default();
    let limit = matches.get_one::<usize>("limit").copied();
    let describe = matches.get_flag("describe");
    let as_json = matches.get_flag("json");

    let config = Config::from_env()?;
    let pool = get_db_pool(&DatabaseConfig::from_url(config.database_url.clone())).await?;

    let mut skill_ids: Vec<i32> = matches
        .get_many::<i32>("skills")
        .map(|ids| ids.copied().collect())
        .unwrap_or_default();

    if let Some(names) = matches.get_many::<String>("skill-names") {
        let names: Vec<String> = names.cloned().collect();
        let resolved = coaches::find_skill_ids(&pool, &names).await?;
        if resolved.len() < names.len() {
            warn!("⚠️ Only {} of {} skill names matched a known skill", resolved.len(), names.len());
        }
        skill_ids.extend(resolved);
    }

    let mut catalogue = match matches.get_one::<i32>("coach") {
        Some(&coach_id) => match coaches::get_coach(&pool, coach_id).await? {
            Some(coach) => vec![coach],
            None => anyhow::bail!("coach {} does not exist", coach_id),
        },
        None => coaches::list_coaches(&pool).await?,
    };

    if let Some(levels) = matches.get_many::<SkillLevel>("min-level") {
        let mut levels: Vec<SkillLevel> = levels.copied().collect();
        if levels.len() == 1 {
            levels = vec![levels[0]; skill_ids.len()];
        }
        let before = catalogue.len();
        catalogue = coaches_by_min_levels(catalogue, &skill_ids, &levels)?;
        info!("🎯 {} of {} coaches meet the minimum skill levels", catalogue.len(), before);
    }

    info!("📊 Ranking {} coaches against {} requested skills", catalogue.len(), skill_ids.len());

    let mut ranked = rank_scored(catalogue, &skill_ids, &location);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    let geocoder = if describe {
        Some(NominatimGeocoder::from_config(&config)?)
    } else {
        None
    };

    let mut rows = Vec::with_capacity(ranked.len());
    for (index, (coach, breakdown)) in ranked.into_iter().enumerate() {
        let place = match &geocoder {
            Some(geocoder) => Some(
                describe_location(geocoder, coach.location.as_deref())
                    .await
                    .display()
                    .to_string(),
            ),
            None => None,
        };

        let name = [coach.first_name.as_deref(), coach.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        rows.push(RankedCoach {
            rank: index + 1,
            coach_id: coach.id,
            name,
            place,
            distance_km: breakdown.distance_km,
            matched_skills: breakdown.matched_skills,
            score: breakdown.total,
        });
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        println!(
            "{:>3}. #{:<5} {:<30} {:>7.1} km  {} skills  score {:.3}{}",
            row.rank,
            row.coach_id,
            row.name,
            row.distance_km,
            row.matched_skills,
            row.score,
            row.place.as_deref().map(|place| format!("  ({})", place)).unwrap_or_default(),
        );
    }

    info!("✅ Ranked {} coaches", rows.len());

    Ok(())
}
