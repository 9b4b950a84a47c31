// Closed answer sets for the event survey questions. Each is stored as TEXT
// and serialized by the same SCREAMING_SNAKE_CASE wire name.

use serde::{Deserialize, Serialize};

/// Lists the variants of an answer enum with their wire names.
macro_rules! answer_values {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Q1: how the respondent identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderIdentity {
    CisgenderWoman,
    TransgenderWoman,
    CisgenderMan,
    TransgenderMan,
    PreferNotToInform,
}

answer_values!(GenderIdentity {
    CisgenderWoman => "CISGENDER_WOMAN",
    TransgenderWoman => "TRANSGENDER_WOMAN",
    CisgenderMan => "CISGENDER_MAN",
    TransgenderMan => "TRANSGENDER_MAN",
    PreferNotToInform => "PREFER_NOT_TO_INFORM",
});

/// Q2: age bracket. Digits get explicit names since case conversion would glue them to the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeRange {
    #[serde(rename = "UNDER_18")]
    #[sqlx(rename = "UNDER_18")]
    Under18,
    #[serde(rename = "AGE_18_25")]
    #[sqlx(rename = "AGE_18_25")]
    Age18To25,
    #[serde(rename = "AGE_26_35")]
    #[sqlx(rename = "AGE_26_35")]
    Age26To35,
    #[serde(rename = "AGE_36_45")]
    #[sqlx(rename = "AGE_36_45")]
    Age36To45,
    #[serde(rename = "OVER_45")]
    #[sqlx(rename = "OVER_45")]
    Over45,
}

answer_values!(AgeRange {
    Under18 => "UNDER_18",
    Age18To25 => "AGE_18_25",
    Age26To35 => "AGE_26_35",
    Age36To45 => "AGE_36_45",
    Over45 => "OVER_45",
});

/// Q3: kind of event attended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ShowsFestivals,
    ExecutiveEvent,
    SoccerGame,
    ChildrenEvent,
    GuidedTour,
}

answer_values!(EventType {
    ShowsFestivals => "SHOWS_FESTIVALS",
    ExecutiveEvent => "EXECUTIVE_EVENT",
    SoccerGame => "SOCCER_GAME",
    ChildrenEvent => "CHILDREN_EVENT",
    GuidedTour => "GUIDED_TOUR",
});

/// Q4: main means of transport to the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportType {
    PrivateCar,
    #[serde(rename = "APP_UBER_99")]
    #[sqlx(rename = "APP_UBER_99")]
    AppUber99,
    PublicTransport,
    RideTaxi,
    Other,
}

answer_values!(TransportType {
    PrivateCar => "PRIVATE_CAR",
    AppUber99 => "APP_UBER_99",
    PublicTransport => "PUBLIC_TRANSPORT",
    RideTaxi => "RIDE_TAXI",
    Other => "OTHER",
});

/// Q6: how easy it was to find the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Findability {
    ExtremelyEasy,
    Easy,
    Reasonable,
    Difficult,
    VeryDifficult,
}

answer_values!(Findability {
    ExtremelyEasy => "EXTREMELY_EASY",
    Easy => "EASY",
    Reasonable => "REASONABLE",
    Difficult => "DIFFICULT",
    VeryDifficult => "VERY_DIFFICULT",
});

/// Q7: best part of the experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Highlight {
    EventQuality,
    StaffService,
    BathroomCleanliness,
    FoodAreas,
    OverallStructure,
    Accessibility,
}

answer_values!(Highlight {
    EventQuality => "EVENT_QUALITY",
    StaffService => "STAFF_SERVICE",
    BathroomCleanliness => "BATHROOM_CLEANLINESS",
    FoodAreas => "FOOD_AREAS",
    OverallStructure => "OVERALL_STRUCTURE",
    Accessibility => "ACCESSIBILITY",
});

/// Q8: main source of frustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frustration {
    ParkingArrival,
    EntryQueues,
    FoodPrices,
    BathroomWait,
    NothingFrustrated,
}

answer_values!(Frustration {
    ParkingArrival => "PARKING_ARRIVAL",
    EntryQueues => "ENTRY_QUEUES",
    FoodPrices => "FOOD_PRICES",
    BathroomWait => "BATHROOM_WAIT",
    NothingFrustrated => "NOTHING_FRUSTRATED",
});

/// Categorical survey column that analytics can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    GenderIdentity,
    AgeRange,
    EventType,
    TransportType,
    GateFindability,
    Highlight,
    Frustration,
}

impl Dimension {
    /// Dimensions reported by research statistics and stored on dashboards.
    pub const DEMOGRAPHIC: [Dimension; 4] = [
        Dimension::GenderIdentity,
        Dimension::AgeRange,
        Dimension::EventType,
        Dimension::TransportType,
    ];

    pub const ALL: [Dimension; 7] = [
        Dimension::GenderIdentity,
        Dimension::AgeRange,
        Dimension::EventType,
        Dimension::TransportType,
        Dimension::GateFindability,
        Dimension::Highlight,
        Dimension::Frustration,
    ];

    /// Column name in the `research` table. Only ever one of these literals.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::GenderIdentity => "gender_identity",
            Dimension::AgeRange => "age_range",
            Dimension::EventType => "event_type",
            Dimension::TransportType => "transport_type",
            Dimension::GateFindability => "gate_findability",
            Dimension::Highlight => "highlight",
            Dimension::Frustration => "frustration",
        }
    }

    /// Field name used in JSON payloads.
    pub fn field(&self) -> &'static str {
        match self {
            Dimension::GenderIdentity => "genderIdentity",
            Dimension::AgeRange => "ageRange",
            Dimension::EventType => "eventType",
            Dimension::TransportType => "transportType",
            Dimension::GateFindability => "gateFindability",
            Dimension::Highlight => "highlight",
            Dimension::Frustration => "frustration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_wire_names<T>(values: &[T], as_str: fn(&T) -> &'static str)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        for value in values {
            let json = serde_json::to_value(value).unwrap();
            assert_eq!(json, as_str(value));
            let back: T = serde_json::from_value(json).unwrap();
            assert_eq!(&back, value);
        }
    }

    #[test]
    fn serde_names_match_stored_names() {
        assert_wire_names(GenderIdentity::ALL, GenderIdentity::as_str);
        assert_wire_names(AgeRange::ALL, AgeRange::as_str);
        assert_wire_names(EventType::ALL, EventType::as_str);
        assert_wire_names(TransportType::ALL, TransportType::as_str);
        assert_wire_names(Findability::ALL, Findability::as_str);
        assert_wire_names(Highlight::ALL, Highlight::as_str);
        assert_wire_names(Frustration::ALL, Frustration::as_str);
    }

    #[test]
    fn digit_variants_keep_separators() {
        assert_eq!(serde_json::to_value(AgeRange::Age18To25).unwrap(), "AGE_18_25");
        assert_eq!(AgeRange::Under18.to_string(), "UNDER_18");
        let back: TransportType = serde_json::from_value(serde_json::json!("APP_UBER_99")).unwrap();
        assert_eq!(back, TransportType::AppUber99);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = serde_json::from_value::<TransportType>(serde_json::json!("SKATEBOARD")).unwrap_err();
        assert!(err.to_string().contains("SKATEBOARD"));
        assert_eq!(GenderIdentity::ALL.len(), 5);
    }

    #[test]
    fn dimension_columns_are_distinct() {
        let mut columns: Vec<&str> = Dimension::ALL.iter().map(|d| d.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), Dimension::ALL.len());
    }
}
