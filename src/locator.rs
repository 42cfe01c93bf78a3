use std::fmt::Display;

/// Where the monthly yellow taxi files are published.
pub const DEFAULT_URL_PREFIX: &str =
    "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/yellow";

/// One month of yellow taxi trip data.  The month is not range checked, an
/// invalid value simply produces a name that won't exist remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripDataSource {
    pub year: i32,
    pub month: u32,
}

impl TripDataSource {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Return the local filename for this month, e.g.
    /// `yellow_tripdata_2021-01.csv.gz`.  Same as the last segment of the url.
    pub fn filename(&self) -> String {
        format!("yellow_tripdata_{}.csv.gz", self)
    }

    pub fn url(&self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.filename())
    }
}

impl Display for TripDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
