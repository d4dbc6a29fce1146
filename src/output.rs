use crate::error::{Error, Result};
use crate::status::{StatusSnapshot, SummaryReport};

pub fn print_status(status: &StatusSnapshot) {
    println!("Time: {}", status.time);
    println!("Ambulances:");
    for ambulance in &status.ambulances {
        let mut line = format!(
            "{}: {} (node {}, home hospital {}",
            ambulance.id, ambulance.state_label, ambulance.location, ambulance.home_hospital
        );
        if let Some(patient) = ambulance.patient {
            line.push_str(&format!(", patient {}", patient));
        }
        line.push(')');
        println!("{}", line);
    }
    println!("Patients:");
    if status.patients.is_empty() {
        println!("(none)");
    }
    for patient in &status.patients {
        let mut line = format!(
            "{}: {} (node {}, called at {}",
            patient.id, patient.state_label, patient.location, patient.call_time
        );
        if let Some(ambulance) = patient.ambulance {
            line.push_str(&format!(", ambulance {}", ambulance));
        }
        if let Some(total) = patient.total_time {
            line.push_str(&format!(", total time {}", total));
        }
        line.push(')');
        println!("{}", line);
    }
    println!("Hospitals:");
    for hospital in &status.hospitals {
        println!(
            "{}: node {}, idle ambulances: {:?}",
            hospital.id, hospital.location, hospital.idle_ambulances
        );
    }
}

pub fn print_summary(summary: &SummaryReport) {
    println!("Summary:");
    println!(
        "completed: {} patients (avg total time: {:.1})",
        summary.completed, summary.avg_time
    );
}

pub fn print_json(status: &StatusSnapshot, summary: &SummaryReport) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Report<'a> {
        status: &'a StatusSnapshot,
        summary: &'a SummaryReport,
    }
    let encoded = serde_json::to_string_pretty(&Report { status, summary })
        .map_err(|err| Error::Encode(err.to_string()))?;
    println!("{}", encoded);
    Ok(())
}
