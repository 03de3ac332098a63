use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use surgery_billing_analytics::{
    AggregateNode, AnalyticsEngine, AnalyticsQuery, Dimension, PaymentEvent, ProcedureRecord,
    RecoveryQuery, SortSpec,
};

const TYPES: [(&str, &str, f64); 4] = [
    ("CATH", "Cardiac Catheterization", 1800.0),
    ("ABL", "Ablation", 4200.0),
    ("PPM", "Pacemaker Implant", 8500.0),
    ("EPS", "Electrophysiology Study", 3100.0),
];

const CARRIERS: [&str; 4] = ["Medicare", "Aetna", "Cigna", "United"];
const SUBCATEGORIES: [&str; 2] = ["Facility", "Professional"];

/// Two years of synthetic procedures. Seeded, so every run prints the same
/// numbers.
fn synthetic_records(count: usize) -> Vec<ProcedureRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    (0..count)
        .map(|i| {
            let (type_code, type_name, base_charge) = TYPES[rng.gen_range(0..TYPES.len())];
            let date_of_service = start + Duration::days(rng.gen_range(0..730));

            let mut record =
                ProcedureRecord::new(format!("P{:05}", 10_000 + i), date_of_service);
            record.chart_number = Some(rng.gen_range(3000..3040));
            record.type_code = Some(type_code.to_string());
            record.type_name = Some(type_name.to_string());
            // Roughly one in twelve claims has no carrier on file.
            if !rng.gen_bool(1.0 / 12.0) {
                record.carrier = Some(CARRIERS[rng.gen_range(0..CARRIERS.len())].to_string());
            }
            record.billing_subcategory =
                Some(SUBCATEGORIES[rng.gen_range(0..SUBCATEGORIES.len())].to_string());
            record.total_charges = base_charge * rng.gen_range(0.8..1.3);

            if rng.gen_bool(0.85) {
                let paid_fraction = rng.gen_range(0.4..1.0);
                let amount = record.total_charges * paid_fraction;
                let delay = rng.gen_range(15..160);
                record.total_payments = amount;
                record.days_to_first_payment = Some(delay);
                record.payments = vec![PaymentEvent {
                    date_of_deposit: date_of_service + Duration::days(delay),
                    amount,
                }];
            }

            record
        })
        .collect()
}

fn print_level(nodes: &[AggregateNode], indent: usize) {
    for node in nodes {
        println!(
            "{:indent$}{}: {} procedures, {:.2} charged, {:.2}% collected",
            "",
            node.group_value,
            node.procedure_count,
            node.total_charges,
            node.collection_rate,
            indent = indent
        );
        if let Some(children) = &node.children {
            print_level(children, indent + 2);
        }
    }
}

fn main() {
    let records = synthetic_records(200);
    let engine = AnalyticsEngine::new(&records);

    let mut query = AnalyticsQuery::new(vec![
        Dimension::SurgeryType,
        Dimension::Carrier,
        Dimension::BillingSubcategory,
    ]);
    query.sort = Some(SortSpec::default());

    let response = engine.run(&query).expect("matrix query should run");

    println!("Three-level matrix (surgery type / carrier / subcategory):");
    print_level(&response.data, 2);

    println!(
        "\nSummary: {} procedures, {:.2} charged, {:.2} collected ({:.2}%)",
        response.summary.total_procedures,
        response.summary.total_charges,
        response.summary.total_payments,
        response.summary.collection_rate
    );

    let report = engine
        .recovery(&RecoveryQuery {
            as_of: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            ..RecoveryQuery::default()
        })
        .unwrap();

    println!("\nRecovery as of {}:", report.as_of);
    println!(
        "   1 month: {:>6.2}% over {} procedures",
        report.overall.recovery_1_month.percent, report.overall.recovery_1_month.procedures
    );
    println!(
        "   3 month: {:>6.2}% over {} procedures",
        report.overall.recovery_3_month.percent, report.overall.recovery_3_month.procedures
    );
    println!(
        "   6 month: {:>6.2}% over {} procedures",
        report.overall.recovery_6_month.percent, report.overall.recovery_6_month.procedures
    );
    println!(
        "  12 month: {:>6.2}% over {} procedures",
        report.overall.recovery_12_month.percent, report.overall.recovery_12_month.procedures
    );

    println!("\nRecovery by carrier:");
    for row in &report.by_carrier {
        println!(
            "  {}: 12-month {:.2}%, overall {:.2}%",
            row.group_value, row.recovery_12_month, row.overall_collection_rate
        );
    }
}
