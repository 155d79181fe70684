#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the hospital accessibility pipeline.

mod export;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use salud_map_analytics::counts;
use salud_map_analytics::proximity::analyze_proximity;
use salud_map_geography::{centers, districts};
use salud_map_pipeline::{DataPaths, load_all_data};
use salud_map_spatial::FacilityIndex;

#[derive(Parser)]
#[command(name = "salud_map_cli", about = "Peru hospital accessibility pipeline")]
struct Cli {
    /// Directory containing IPRESS.csv, DISTRITOS.geojson and CCPP_0.zip
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and clean the facility registry, printing a summary
    Hospitals,
    /// Load the district boundary layer, printing a summary
    Districts,
    /// Count facilities per district and report districts without any
    Counts,
    /// Print facility totals per department, best served first
    Departments,
    /// Proximity analysis for one department (requires the gazetteer)
    Proximity {
        /// Department name, e.g. "LIMA"
        #[arg(long)]
        department: String,
    },
    /// Run the full pipeline and export the bundle for the dashboard
    Export {
        /// Output directory for the GeoJSON/JSON files
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let paths = DataPaths::from_data_dir(&cli.data_dir);

    match cli.command {
        Commands::Hospitals => {
            let facilities = salud_map_ingest::load_and_clean_facilities(&paths.facilities)?;
            println!("{} operational facilities with valid coordinates", facilities.len());
        }
        Commands::Districts => {
            let district_table = districts::load_districts(&paths.boundaries)?;
            println!("{} district boundaries loaded", district_table.len());
        }
        Commands::Counts => {
            let facilities = salud_map_ingest::load_and_clean_facilities(&paths.facilities)?;
            let district_table = districts::load_districts(&paths.boundaries)?;
            let joined = counts::join_facilities(&facilities, &district_table);
            let table = counts::district_counts(&joined, &district_table);

            let without = table.iter().filter(|row| row.hospital_count == 0).count();
            println!(
                "{} districts, {} without a single facility",
                table.len(),
                without
            );

            let mut ranked: Vec<_> = table.iter().collect();
            ranked.sort_by(|a, b| b.hospital_count.cmp(&a.hospital_count));
            println!("{:<8} {:<30} FACILITIES", "UBIGEO", "DISTRICT");
            println!("{}", "-".repeat(50));
            for row in ranked.iter().take(10) {
                println!(
                    "{:<8} {:<30} {}",
                    row.district_code, row.district_name, row.hospital_count
                );
            }
        }
        Commands::Departments => {
            let facilities = salud_map_ingest::load_and_clean_facilities(&paths.facilities)?;
            let district_table = districts::load_districts(&paths.boundaries)?;
            let joined = counts::join_facilities(&facilities, &district_table);

            println!("{:<20} FACILITIES", "DEPARTMENT");
            println!("{}", "-".repeat(32));
            for total in counts::department_totals(&joined) {
                println!("{:<20} {}", total.department, total.total_hospitals);
            }
        }
        Commands::Proximity { department } => {
            let facilities = salud_map_ingest::load_and_clean_facilities(&paths.facilities)?;
            let district_table = districts::load_districts(&paths.boundaries)?;
            let joined = counts::join_facilities(&facilities, &district_table);
            let index =
                FacilityIndex::from_points(joined.iter().map(|row| row.facility.location()));

            let Some(center_table) = centers::load_population_centers(&paths.population_centers)?
            else {
                return Err(format!(
                    "population-center archive not found at {}",
                    paths.population_centers.display()
                )
                .into());
            };

            match analyze_proximity(&center_table, &index, &department) {
                Some(analysis) => {
                    println!(
                        "{}: {} population centers",
                        analysis.department,
                        analysis.per_center.len()
                    );
                    println!(
                        "  most isolated:     {} ({} facilities within 10 km)",
                        analysis.isolated.center.name.as_deref().unwrap_or("<unnamed>"),
                        analysis.isolated.facilities_within
                    );
                    println!(
                        "  most concentrated: {} ({} facilities within 10 km)",
                        analysis
                            .concentrated
                            .center
                            .name
                            .as_deref()
                            .unwrap_or("<unnamed>"),
                        analysis.concentrated.facilities_within
                    );
                }
                None => {
                    println!("No population centers found for department {department}");
                }
            }
        }
        Commands::Export { out } => {
            let bundle = load_all_data(&paths)?;
            let written = export::export_bundle(&bundle, &out)?;
            println!("Exported {} files to {}", written.len(), out.display());
            for path in written {
                println!("  {}", path.display());
            }
        }
    }

    Ok(())
}
