//! Fixed reference data inserted before any random activity is generated.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use doctor_cell::models::{DoctorInput, DoctorShift, SpecialtyInput};
use patient_cell::models::{Coverage, PatientInput};
use pharmacy_cell::models::{LaboratoryInput, MedicationInput};

const SPECIALTIES: [(&str, &str); 7] = [
    ("Cardiology", "Heart and circulatory system"),
    ("Pediatrics", "Care of children and adolescents"),
    ("Traumatology", "Injuries of the musculoskeletal system"),
    ("General Medicine", "Comprehensive and preventive care"),
    ("Gynecology", "Women's health"),
    ("Dermatology", "Diseases of the skin"),
    ("Ophthalmology", "Care of the eyes"),
];

struct PersonSeed {
    national_id: &'static str,
    first_name: &'static str,
    paternal_surname: &'static str,
    maternal_surname: &'static str,
    phone: &'static str,
    email: &'static str,
}

const PATIENTS: [(PersonSeed, (i32, u32, u32), &str, Coverage); 5] = [
    (
        PersonSeed {
            national_id: "12345678-9",
            first_name: "María",
            paternal_surname: "González",
            maternal_surname: "López",
            phone: "+56912345678",
            email: "maria.gonzalez@email.com",
        },
        (1985, 3, 15),
        "Av. Libertador 1234, Santiago",
        Coverage::Fonasa,
    ),
    (
        PersonSeed {
            national_id: "23456789-0",
            first_name: "Juan",
            paternal_surname: "Pérez",
            maternal_surname: "Soto",
            phone: "+56923456789",
            email: "juan.perez@email.com",
        },
        (1990, 7, 22),
        "Calle Principal 567, Providencia",
        Coverage::Isapre,
    ),
    (
        PersonSeed {
            national_id: "34567890-1",
            first_name: "Ana",
            paternal_surname: "Martínez",
            maternal_surname: "Rojas",
            phone: "+56934567890",
            email: "ana.martinez@email.com",
        },
        (1978, 11, 8),
        "Pasaje Los Robles 890, Las Condes",
        Coverage::Fonasa,
    ),
    (
        PersonSeed {
            national_id: "45678901-2",
            first_name: "Carlos",
            paternal_surname: "Silva",
            maternal_surname: "Vargas",
            phone: "+56945678901",
            email: "carlos.silva@email.com",
        },
        (1995, 5, 30),
        "Av. Apoquindo 2345, Las Condes",
        Coverage::Private,
    ),
    (
        PersonSeed {
            national_id: "56789012-3",
            first_name: "Patricia",
            paternal_surname: "Fernández",
            maternal_surname: "Muñoz",
            phone: "+56956789012",
            email: "patricia.fernandez@email.com",
        },
        (1982, 9, 12),
        "Calle Los Pinos 456, Ñuñoa",
        Coverage::Isapre,
    ),
];

const DOCTORS: [(PersonSeed, &str, (i32, u32, u32), DoctorShift); 4] = [
    (
        PersonSeed {
            national_id: "11111111-1",
            first_name: "Roberto",
            paternal_surname: "Carrasco",
            maternal_surname: "Torres",
            phone: "+56911111111",
            email: "r.carrasco@clinic.cl",
        },
        "REG-001",
        (2015, 1, 10),
        DoctorShift::FullTime,
    ),
    (
        PersonSeed {
            national_id: "22222222-2",
            first_name: "Laura",
            paternal_surname: "Ramírez",
            maternal_surname: "Núñez",
            phone: "+56922222222",
            email: "l.ramirez@clinic.cl",
        },
        "REG-002",
        (2018, 5, 20),
        DoctorShift::FullTime,
    ),
    (
        PersonSeed {
            national_id: "33333333-3",
            first_name: "Diego",
            paternal_surname: "Morales",
            maternal_surname: "Castro",
            phone: "+56933333333",
            email: "d.morales@clinic.cl",
        },
        "REG-003",
        (2020, 3, 15),
        DoctorShift::PartTime,
    ),
    (
        PersonSeed {
            national_id: "44444444-4",
            first_name: "Carmen",
            paternal_surname: "Vega",
            maternal_surname: "Bravo",
            phone: "+56944444444",
            email: "c.vega@clinic.cl",
        },
        "REG-004",
        (2017, 9, 1),
        DoctorShift::FullTime,
    ),
];

/// A medication of the demo inventory and the laboratory that makes it.
pub struct MedicationSeed {
    pub name: &'static str,
    pub active_ingredient: &'static str,
    pub form: &'static str,
    pub concentration: &'static str,
    pub laboratory: &'static str,
    pub requires_prescription: bool,
    pub stock: i32,
}

pub const MEDICATIONS: [MedicationSeed; 5] = [
    MedicationSeed {
        name: "Paracetamol",
        active_ingredient: "Paracetamol",
        form: "Tablets",
        concentration: "500mg",
        laboratory: "Laboratorio Chile",
        requires_prescription: false,
        stock: 500,
    },
    MedicationSeed {
        name: "Ibuprofen",
        active_ingredient: "Ibuprofen",
        form: "Capsules",
        concentration: "400mg",
        laboratory: "Farma Plus",
        requires_prescription: false,
        stock: 300,
    },
    MedicationSeed {
        name: "Amoxicillin",
        active_ingredient: "Amoxicillin",
        form: "Capsules",
        concentration: "500mg",
        laboratory: "Antibióticos S.A.",
        requires_prescription: true,
        stock: 200,
    },
    MedicationSeed {
        name: "Losartan",
        active_ingredient: "Losartan",
        form: "Tablets",
        concentration: "50mg",
        laboratory: "CardioMed",
        requires_prescription: true,
        stock: 150,
    },
    MedicationSeed {
        name: "Omeprazole",
        active_ingredient: "Omeprazole",
        form: "Capsules",
        concentration: "20mg",
        laboratory: "Gastro Lab",
        requires_prescription: false,
        stock: 250,
    },
];

pub const REASONS: [&str; 7] = [
    "Persistent abdominal pain",
    "Blood pressure check",
    "Frequent headaches",
    "Routine pediatric check",
    "Joint pain",
    "General health checkup",
    "Breathing problems",
];

pub const DOSAGES: [&str; 4] = ["1 tablet", "2 tablets", "1 capsule", "2 capsules"];
pub const FREQUENCIES: [&str; 4] = ["Every 8 hours", "Every 12 hours", "Once a day", "Twice a day"];
pub const DURATIONS: [&str; 4] = ["7 days", "10 days", "14 days", "30 days"];

pub const DIAGNOSIS: &str = "Diagnosis according to clinical evaluation.";
pub const NOTES: &str = "Patient stable, follow the instructions.";
pub const INSTRUCTIONS: &str = "Relative rest. Take the medication as indicated. Follow-up in 15 days.";
pub const SPECIAL_INSTRUCTIONS: &str = "Take with food. Avoid alcohol during the treatment.";

fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub fn specialties() -> Vec<SpecialtyInput> {
    SPECIALTIES
        .iter()
        .map(|(name, description)| SpecialtyInput {
            name: name.to_string(),
            description: description.to_string(),
            active: true,
        })
        .collect()
}

pub fn patients() -> Vec<PatientInput> {
    PATIENTS
        .iter()
        .map(|(person, birth_date, address, coverage)| PatientInput {
            national_id: person.national_id.to_string(),
            first_name: person.first_name.to_string(),
            paternal_surname: person.paternal_surname.to_string(),
            maternal_surname: person.maternal_surname.to_string(),
            birth_date: date(*birth_date),
            phone: person.phone.to_string(),
            email: person.email.to_string(),
            address: address.to_string(),
            coverage: *coverage,
            active: true,
        })
        .collect()
}

/// Doctors take the given specialties in turn.
pub fn doctors(specialty_ids: &[i64]) -> Vec<DoctorInput> {
    if specialty_ids.is_empty() {
        return Vec::new();
    }

    DOCTORS
        .iter()
        .enumerate()
        .map(|(i, (person, registration_number, hired_on, shift))| DoctorInput {
            national_id: person.national_id.to_string(),
            first_name: person.first_name.to_string(),
            paternal_surname: person.paternal_surname.to_string(),
            maternal_surname: person.maternal_surname.to_string(),
            specialty_id: specialty_ids[i % specialty_ids.len()],
            phone: person.phone.to_string(),
            email: person.email.to_string(),
            registration_number: registration_number.to_string(),
            shift: *shift,
            active: true,
            hired_on: date(*hired_on),
        })
        .collect()
}

/// One laboratory per distinct maker in the medication catalogue, sorted by name.
pub fn laboratories() -> Vec<LaboratoryInput> {
    let names: BTreeSet<&str> = MEDICATIONS.iter().map(|m| m.laboratory).collect();
    names
        .into_iter()
        .map(|name| LaboratoryInput {
            name: name.to_string(),
            country: "Chile".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            active: true,
        })
        .collect()
}

impl MedicationSeed {
    pub fn to_input(&self, laboratory_id: i64) -> MedicationInput {
        MedicationInput {
            name: self.name.to_string(),
            active_ingredient: self.active_ingredient.to_string(),
            form: self.form.to_string(),
            concentration: self.concentration.to_string(),
            laboratory_id,
            requires_prescription: self.requires_prescription,
            stock: self.stock,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctors_cycle_through_specialties() {
        let doctors = doctors(&[10, 20, 30]);
        let assigned: Vec<i64> = doctors.iter().map(|d| d.specialty_id).collect();
        assert_eq!(assigned, vec![10, 20, 30, 10]);
        assert!(super::doctors(&[]).is_empty());
    }

    #[test]
    fn every_medication_has_a_laboratory() {
        let labs = laboratories();
        assert_eq!(labs.len(), 5);
        for medication in &MEDICATIONS {
            assert!(labs.iter().any(|lab| lab.name == medication.laboratory));
        }
    }
}
