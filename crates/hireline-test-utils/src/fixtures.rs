//! Canonical fixtures: the intake form schema and sample list rows.

use std::sync::Arc;

use hireline_core::{
    FieldDependency, FieldKind, FieldSpec, FormSchema, LookupCategory, LookupOption,
    RecordSummary, SideEffect, LOCALITY_GATE_CITY,
};

/// Call statuses under which lineup-style details become required.
pub const LINEUP_STATUSES: [&str; 2] = ["Lineup", "Walkin at Infidea"];

/// The canonical call-intake form schema, as every intake-style screen
/// instantiates it: contact mirroring, status-driven requiredness and date
/// resets, the state→city→locality cascade, and the company→process edge
/// with `"others"` passthrough.
pub fn intake_schema() -> Arc<FormSchema> {
    Arc::new(
        FormSchema::new()
            .field(FieldSpec::new("contactNumber", "Contact Number", FieldKind::Text).required())
            .field(FieldSpec::new(
                "whatsappNumber",
                "WhatsApp Number",
                FieldKind::Text,
            ))
            .field(FieldSpec::new("candidateName", "Candidate Name", FieldKind::Text).required())
            .field(
                FieldSpec::new("state", "State", FieldKind::Select)
                    .required_when("callStatus", LINEUP_STATUSES),
            )
            .field(FieldSpec::new("city", "City", FieldKind::Select))
            .field(FieldSpec::new("locality", "Locality", FieldKind::Select))
            .field(
                FieldSpec::new("qualification", "Qualification", FieldKind::Select)
                    .required_when("callStatus", LINEUP_STATUSES),
            )
            .field(
                FieldSpec::new("experience", "Experience", FieldKind::Select)
                    .required_when("callStatus", LINEUP_STATUSES),
            )
            .field(FieldSpec::new("jobProfile", "Job Profile", FieldKind::Select))
            .field(FieldSpec::new("callStatus", "Call Status", FieldKind::Select).required())
            .field(
                FieldSpec::new("lineupCompany", "Company", FieldKind::Select)
                    .with_companion("customLineupCompany"),
            )
            .field(FieldSpec::new(
                "customLineupCompany",
                "Custom Company",
                FieldKind::Text,
            ))
            .field(
                FieldSpec::new("lineupProcess", "Process", FieldKind::Select)
                    .with_companion("customLineupProcess"),
            )
            .field(FieldSpec::new(
                "customLineupProcess",
                "Custom Process",
                FieldKind::Text,
            ))
            .field(FieldSpec::new("lineupDate", "Lineup Date", FieldKind::Date))
            .field(FieldSpec::new(
                "interviewDate",
                "Interview Date",
                FieldKind::Date,
            ))
            .field(FieldSpec::new("walkinDate", "Walkin Date", FieldKind::Date))
            .field(FieldSpec::new("remarks", "Remarks", FieldKind::Textarea))
            .dependency(FieldDependency::standard(
                "state",
                "city",
                LookupCategory::Cities,
            ))
            .dependency(FieldDependency::gated(
                "city",
                "locality",
                LookupCategory::Localities,
                LOCALITY_GATE_CITY,
            ))
            .dependency(FieldDependency::others_passthrough(
                "lineupCompany",
                "lineupProcess",
                LookupCategory::Processes,
            ))
            .effect(SideEffect::Mirror {
                from: "contactNumber".into(),
                to: "whatsappNumber".into(),
            })
            .effect(SideEffect::RetainOnChange {
                trigger: "callStatus".into(),
                groups: vec![
                    (
                        "Lineup".into(),
                        vec!["lineupDate".into(), "interviewDate".into()],
                    ),
                    ("Walkin at Infidea".into(), vec!["walkinDate".into()]),
                ],
            }),
    )
}

/// Sample call-detail rows spanning statuses, cities, and dates.
pub fn call_detail_rows() -> Vec<RecordSummary> {
    vec![
        RecordSummary::new("cd-1")
            .with_field("candidateName", "Priya Sharma")
            .with_field("callStatus", "Lineup")
            .with_field("city", "Indore")
            .with_field("callDate", "2025-01-10"),
        RecordSummary::new("cd-2")
            .with_field("candidateName", "Rahul Verma")
            .with_field("callStatus", "Not Interested")
            .with_field("city", "Bhopal")
            .with_field("callDate", "2025-01-12"),
        RecordSummary::new("cd-3")
            .with_field("candidateName", "Sneha Patel")
            .with_field("callStatus", "Walkin at Infidea")
            .with_field("city", "Indore")
            .with_field("callDate", "2025-02-03"),
        RecordSummary::new("cd-4")
            .with_field("candidateName", "Amit Kumar")
            .with_field("callStatus", "Lineup")
            .with_field("city", "Mumbai")
            .with_field("callDate", "2025-02-18"),
        RecordSummary::new("cd-5")
            .with_field("candidateName", "Neha Singh")
            .with_field("callStatus", "Callback")
            .with_field("city", "Indore")
            .with_field("callDate", "2025-03-01"),
    ]
}

/// Indian-state options used by lookup-driven tests.
pub fn state_options() -> Vec<LookupOption> {
    vec![
        LookupOption::new("MP", "Madhya Pradesh"),
        LookupOption::new("MH", "Maharashtra"),
        LookupOption::new("UP", "Uttar Pradesh"),
    ]
}

/// City options for a state code.
pub fn city_options(state: &str) -> Vec<LookupOption> {
    match state {
        "MP" => vec![
            LookupOption::plain("Indore"),
            LookupOption::plain("Bhopal"),
            LookupOption::plain("Gwalior"),
        ],
        "MH" => vec![LookupOption::plain("Mumbai"), LookupOption::plain("Pune")],
        _ => vec![LookupOption::plain("Lucknow"), LookupOption::plain("Noida")],
    }
}

/// Locality options for the gate city.
pub fn locality_options() -> Vec<LookupOption> {
    vec![
        LookupOption::plain("Vijay Nagar"),
        LookupOption::plain("Palasia"),
        LookupOption::plain("Rau"),
    ]
}
