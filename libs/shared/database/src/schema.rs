use std::fmt;

/// Every table the clinic stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Specialties,
    Patients,
    Doctors,
    Laboratories,
    Medications,
    Consultations,
    Treatments,
    Prescriptions,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Deleting the referenced row fails while references exist.
    Protect,
    /// Deleting the referenced row deletes the referencing rows too.
    Cascade,
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: Table,
    pub on_delete: OnDelete,
}

const NO_KEYS: &[ForeignKey] = &[];

const DOCTOR_KEYS: &[ForeignKey] = &[ForeignKey {
    column: "specialty_id",
    references: Table::Specialties,
    on_delete: OnDelete::Protect,
}];

const MEDICATION_KEYS: &[ForeignKey] = &[ForeignKey {
    column: "laboratory_id",
    references: Table::Laboratories,
    on_delete: OnDelete::Protect,
}];

const CONSULTATION_KEYS: &[ForeignKey] = &[
    ForeignKey {
        column: "patient_id",
        references: Table::Patients,
        on_delete: OnDelete::Protect,
    },
    ForeignKey {
        column: "doctor_id",
        references: Table::Doctors,
        on_delete: OnDelete::Protect,
    },
];

const TREATMENT_KEYS: &[ForeignKey] = &[ForeignKey {
    column: "consultation_id",
    references: Table::Consultations,
    on_delete: OnDelete::Cascade,
}];

const PRESCRIPTION_KEYS: &[ForeignKey] = &[
    ForeignKey {
        column: "treatment_id",
        references: Table::Treatments,
        on_delete: OnDelete::Cascade,
    },
    ForeignKey {
        column: "medication_id",
        references: Table::Medications,
        on_delete: OnDelete::Protect,
    },
];

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Specialties,
        Table::Patients,
        Table::Doctors,
        Table::Laboratories,
        Table::Medications,
        Table::Consultations,
        Table::Treatments,
        Table::Prescriptions,
        Table::Users,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Specialties => "specialties",
            Table::Patients => "patients",
            Table::Doctors => "doctors",
            Table::Laboratories => "laboratories",
            Table::Medications => "medications",
            Table::Consultations => "consultations",
            Table::Treatments => "treatments",
            Table::Prescriptions => "prescriptions",
            Table::Users => "users",
        }
    }

    /// Human label used in messages, e.g. "specialty".
    pub fn singular(&self) -> &'static str {
        match self {
            Table::Specialties => "specialty",
            Table::Patients => "patient",
            Table::Doctors => "doctor",
            Table::Laboratories => "laboratory",
            Table::Medications => "medication",
            Table::Consultations => "consultation",
            Table::Treatments => "treatment",
            Table::Prescriptions => "prescription",
            Table::Users => "user",
        }
    }

    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Specialties => &["name"],
            Table::Patients => &["national_id"],
            Table::Doctors => &["national_id", "registration_number"],
            Table::Laboratories => &["name"],
            Table::Users => &["username"],
            Table::Medications
            | Table::Consultations
            | Table::Treatments
            | Table::Prescriptions => &[],
        }
    }

    pub fn foreign_keys(&self) -> &'static [ForeignKey] {
        match self {
            Table::Doctors => DOCTOR_KEYS,
            Table::Medications => MEDICATION_KEYS,
            Table::Consultations => CONSULTATION_KEYS,
            Table::Treatments => TREATMENT_KEYS,
            Table::Prescriptions => PRESCRIPTION_KEYS,
            Table::Specialties | Table::Patients | Table::Laboratories | Table::Users => NO_KEYS,
        }
    }

    /// Foreign keys in other tables that point at this one.
    pub fn referenced_by(&self) -> Vec<(Table, &'static ForeignKey)> {
        Table::ALL
            .iter()
            .flat_map(|table| {
                table
                    .foreign_keys()
                    .iter()
                    .filter(|fk| fk.references == *self)
                    .map(move |fk| (*table, fk))
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
