use surgery_billing_analytics::{
    build_procedure_records, import_summary, AnalyticsEngine, AnalyticsQuery, Dimension,
    SortDirection, SortField, SortSpec, TransactionRow,
};

// A small export from the practice-management system. Blank fields are the
// norm: payment rows only carry the deposit, and some charges arrive with no
// carrier on file yet.
const TRANSACTIONS_CSV: &str = "\
procedure_id,chart_number,date_of_service,date_of_deposit,type_code,surgery_type,carrier,billing_subcategory,charges,total_payments,adjustments
P2001A,2001,2023-09-12,,CATH,Cardiac Catheterization,Medicare,Facility,1800,0,0
P2001A,,,2023-10-20,,,,,0,1100,0
P2001A,,,2023-12-05,,,,,0,400,0
P2002A,2002,2023-10-03,,ABL,Ablation,Aetna,Facility,4200,0,0
P2002A,,,2024-02-15,,,,,0,4200,0
P2003A,2003,2023-11-18,,PPM,Pacemaker Implant,Cigna,Facility,8500,0,0
P2003A,,,,,,,,0,0,8300
P2004A,2004,2024-01-22,,CATH,Cardiac Catheterization,,,1600,0,0
P2004A,,,2024-03-01,,,,,0,350,0
P2005A,2005,2024-02-09,,ABL,Ablation,Aetna,Professional,3900,0,0
";

fn main() {
    let mut reader = csv::Reader::from_reader(TRANSACTIONS_CSV.as_bytes());
    let rows: Vec<TransactionRow> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("transaction CSV should deserialize");

    let records = build_procedure_records(&rows);
    let summary = import_summary(&rows, &records);

    println!("Import summary:");
    println!("  transactions: {}", summary.transactions_imported);
    println!("  procedures:   {}", summary.procedures_created);
    println!("  patients:     {}", summary.patients_count);
    println!("  skipped:      {}", summary.procedures_skipped);

    let engine = AnalyticsEngine::new(&records);

    let dashboard = engine.dashboard();
    println!("\nDashboard:");
    println!("  total charges:    {:.2}", dashboard.total_charges);
    println!("  total payments:   {:.2}", dashboard.total_payments);
    println!("  collection rate:  {:.2}%", dashboard.collection_rate);
    if let Some(days) = dashboard.avg_days_to_payment {
        println!("  avg days to pay:  {:.1}", days);
    }

    let mut query = AnalyticsQuery::new(vec![Dimension::SurgeryType, Dimension::Carrier]);
    query.sort = Some(SortSpec {
        field: SortField::TotalCharges,
        direction: SortDirection::Desc,
    });
    let response = engine.run(&query).expect("matrix query should run");

    println!("\nCharges by surgery type and carrier:");
    for node in &response.data {
        let label = node.type_name.as_deref().unwrap_or(&node.group_value);
        println!(
            "  {} ({} procedures): {:.2} charged, {:.2}% collected",
            label, node.procedure_count, node.total_charges, node.collection_rate
        );
        if let Some(carriers) = &node.children {
            for carrier in carriers {
                println!(
                    "    {}: {:.2} charged, {:.2}% collected",
                    carrier.group_value, carrier.total_charges, carrier.collection_rate
                );
            }
        }
    }

    println!(
        "\nGrand total: {:.2} charged, {:.2} collected ({:.2}%)",
        response.summary.total_charges,
        response.summary.total_payments,
        response.summary.collection_rate
    );
}
