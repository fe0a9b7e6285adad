use serde::Deserialize;

pub const FLIGHTS_PER_AIRPORT: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Airport {
    #[serde(default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub passengers: i64,
}

impl Airport {
    pub fn new(code: &str, name: &str, passengers: i64) -> Self {
        Self {
            id: 0,
            code: code.to_string(),
            name: name.to_string(),
            passengers,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flight {
    pub origin: String,
    pub destination: String,
    pub name: String,
}

impl Flight {
    pub fn label(&self) -> String {
        format!(
            "{} (origin {}, destination {})",
            self.name, self.origin, self.destination
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Favorite {
    pub id: i64,
    pub destination: String,
    pub origin: String,
}

/// One line of the main list. Favorites reuse the airport row shape: the
/// origin code goes in `name` and the destination code in `code`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRow {
    pub name: String,
    pub code: String,
}

impl ListRow {
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.code)
    }
}

impl From<&Airport> for ListRow {
    fn from(airport: &Airport) -> Self {
        ListRow {
            name: airport.name.clone(),
            code: airport.code.clone(),
        }
    }
}

impl From<&Favorite> for ListRow {
    fn from(favorite: &Favorite) -> Self {
        ListRow {
            name: favorite.origin.clone(),
            code: favorite.destination.clone(),
        }
    }
}

pub fn generate_flights(origin: &str) -> Vec<Flight> {
    (1..=FLIGHTS_PER_AIRPORT)
        .map(|i| Flight {
            origin: origin.to_string(),
            destination: format!("DEST{i}"),
            name: format!("Vuelo {i}"),
        })
        .collect()
}

pub fn seed_airports() -> Vec<Airport> {
    vec![
        Airport::new("JFK", "John F. Kennedy International Airport", 6),
        Airport::new("LAX", "Los Angeles International Airport", 8),
        Airport::new("ORD", "O'Hare International Airport", 7),
        Airport::new("DFW", "Dallas/Fort Worth International Airport", 85),
        Airport::new("ATL", "Hartsfield-Jackson Atlanta International Airport", 95),
        Airport::new("SFO", "San Francisco International Airport", 50),
        Airport::new("DEN", "Denver International Airport", 65),
        Airport::new("SEA", "Seattle-Tacoma International Airport", 45),
        Airport::new("MIA", "Miami International Airport", 40),
        Airport::new("LAS", "McCarran International Airport", 42),
    ]
}
