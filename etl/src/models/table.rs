use serde::Serialize;
use std::fmt;

/// Every table the pipeline owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    StagingEvents,
    StagingSongs,
    Users,
    Artists,
    Songs,
    Times,
    Songplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Staging,
    Dimension,
    Fact,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::StagingEvents,
        Table::StagingSongs,
        Table::Users,
        Table::Artists,
        Table::Songs,
        Table::Times,
        Table::Songplay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::StagingEvents => "staging_events",
            Table::StagingSongs => "staging_songs",
            Table::Users => "users",
            Table::Artists => "artists",
            Table::Songs => "songs",
            Table::Times => "times",
            Table::Songplay => "songplay",
        }
    }

    pub fn kind(self) -> TableKind {
        match self {
            Table::StagingEvents | Table::StagingSongs => TableKind::Staging,
            Table::Users | Table::Artists | Table::Songs | Table::Times => TableKind::Dimension,
            Table::Songplay => TableKind::Fact,
        }
    }

    /// Tables named in this table's `REFERENCES` clauses.
    pub fn references(self) -> &'static [Table] {
        match self {
            Table::Songs => &[Table::Artists],
            Table::Songplay => &[Table::Times, Table::Users, Table::Songs],
            _ => &[],
        }
    }

    pub fn drop_sql(self) -> String {
        format!("DROP TABLE IF EXISTS {}", crate::sql::quote_ident(self.name()))
    }

    pub fn create_sql(self) -> String {
        format!(
            "CREATE TABLE {} (\n{}\n)",
            crate::sql::quote_ident(self.name()),
            self.column_definitions()
        )
    }

    fn column_definitions(self) -> &'static str {
        match self {
            Table::StagingEvents => {
                "    artist VARCHAR(200),
    auth VARCHAR(200),
    firstName VARCHAR(200),
    gender VARCHAR(5),
    itemInSession INT,
    lastName VARCHAR(200),
    length DOUBLE PRECISION,
    level VARCHAR(10),
    location VARCHAR(200),
    method VARCHAR(5),
    page VARCHAR(20),
    registration DOUBLE PRECISION,
    sessionId INT,
    song VARCHAR(200) DISTKEY,
    status INT,
    ts BIGINT,
    userAgent VARCHAR(200),
    userId INT"
            }
            Table::StagingSongs => {
                "    num_songs INT,
    artist_id VARCHAR(20),
    artist_latitude DOUBLE PRECISION,
    artist_longitude DOUBLE PRECISION,
    artist_location VARCHAR(200),
    artist_name VARCHAR(200),
    song_id VARCHAR(20),
    title VARCHAR(200) DISTKEY,
    duration DOUBLE PRECISION,
    year INT"
            }
            // user_id comes from the event data, so no IDENTITY here.
            Table::Users => {
                "    user_id INT NOT NULL,
    first_name VARCHAR(200),
    last_name VARCHAR(200),
    gender VARCHAR(5),
    level VARCHAR(10) NOT NULL,
    PRIMARY KEY (user_id)"
            }
            Table::Artists => {
                "    artist_id VARCHAR(20) NOT NULL,
    name VARCHAR(200) NOT NULL,
    location VARCHAR(200),
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    PRIMARY KEY (artist_id)"
            }
            Table::Songs => {
                "    song_id VARCHAR(20) NOT NULL,
    title VARCHAR(200),
    artist_id VARCHAR(20) REFERENCES artists (artist_id),
    year INT,
    duration DOUBLE PRECISION,
    PRIMARY KEY (song_id)"
            }
            Table::Times => {
                "    start_time TIMESTAMP NOT NULL,
    hour INT,
    day INT,
    week INT,
    month INT,
    year INT,
    weekday INT,
    PRIMARY KEY (start_time)"
            }
            Table::Songplay => {
                "    songplay_id INT IDENTITY(0,1) NOT NULL,
    start_time TIMESTAMP NOT NULL REFERENCES times (start_time),
    user_id INT NOT NULL REFERENCES users (user_id),
    level VARCHAR(10) NOT NULL,
    song_id VARCHAR(20) NOT NULL REFERENCES songs (song_id),
    artist_id VARCHAR(20) NOT NULL,
    session_id INT NOT NULL,
    location VARCHAR(200),
    user_agent VARCHAR(200)"
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
