//! Staging-to-analysis transforms
//!
//! Plain `INSERT ... SELECT` statements, valid on both Redshift and Postgres.
//! Only `NextSong` events count as plays. Dimension inserts keep one row per
//! key with `ROW_NUMBER()` and skip keys the target already holds, so a
//! dimension never gains duplicates, even across repeated runs. The fact
//! insert has no such guard.

use dwh_common::Table;

const SONGPLAYS: &str = r#"INSERT INTO songplays (
        start_time
       ,user_id
       ,level
       ,song_id
       ,artist_id
       ,session_id
       ,location
       ,user_agent
    )
    SELECT  DISTINCT TIMESTAMP 'epoch' + ev.ts / 1000 * INTERVAL '1 second' AS start_time
           ,ev.userId                                                       AS user_id
           ,ev.level                                                        AS level
           ,so.song_id                                                      AS song_id
           ,so.artist_id                                                    AS artist_id
           ,ev.sessionId                                                    AS session_id
           ,ev.location                                                     AS location
           ,ev.userAgent                                                    AS user_agent
    FROM staging_events AS ev
    JOIN staging_songs AS so
        ON (    ev.artist = so.artist_name
            AND ev.song = so.title
           )
    WHERE ev.page = 'NextSong'
      AND ev.userId IS NOT NULL;"#;

// Latest event wins; equal timestamps fall back to paid-before-free, then name.
const USERS: &str = r#"INSERT INTO users (
        user_id
       ,first_name
       ,last_name
       ,gender
       ,level
    )
    SELECT  latest.user_id
           ,latest.first_name
           ,latest.last_name
           ,latest.gender
           ,latest.level
    FROM (
        SELECT  userId     AS user_id
               ,firstName  AS first_name
               ,lastName   AS last_name
               ,gender     AS gender
               ,level      AS level
               ,ROW_NUMBER() OVER (
                    PARTITION BY userId
                    ORDER BY ts DESC, level DESC, lastName, firstName, gender
                )          AS recency
        FROM staging_events
        WHERE page = 'NextSong'
          AND userId IS NOT NULL
    ) AS latest
    WHERE latest.recency = 1
      AND NOT EXISTS (SELECT 1 FROM users AS u WHERE u.user_id = latest.user_id);"#;

const SONGS: &str = r#"INSERT INTO songs (
        song_id
       ,title
       ,artist_id
       ,year
       ,duration
    )
    SELECT  ranked.song_id
           ,ranked.title
           ,ranked.artist_id
           ,ranked.year
           ,ranked.duration
    FROM (
        SELECT  song_id
               ,title
               ,artist_id
               ,year
               ,duration
               ,ROW_NUMBER() OVER (
                    PARTITION BY song_id
                    ORDER BY title, artist_id, year, duration
                ) AS occurrence
        FROM staging_songs
    ) AS ranked
    WHERE ranked.occurrence = 1
      AND NOT EXISTS (SELECT 1 FROM songs AS s WHERE s.song_id = ranked.song_id);"#;

// Rows carrying coordinates and a location are preferred for an artist.
const ARTISTS: &str = r#"INSERT INTO artists (
        artist_id
       ,name
       ,location
       ,latitude
       ,longitude
    )
    SELECT  ranked.artist_id
           ,ranked.name
           ,ranked.location
           ,ranked.latitude
           ,ranked.longitude
    FROM (
        SELECT  artist_id                                AS artist_id
               ,artist_name                              AS name
               ,artist_location                          AS location
               ,CAST(artist_latitude AS DECIMAL(10,8))   AS latitude
               ,CAST(artist_longitude AS DECIMAL(11,8))  AS longitude
               ,ROW_NUMBER() OVER (
                    PARTITION BY artist_id
                    ORDER BY CASE WHEN artist_latitude IS NULL THEN 1 ELSE 0 END
                            ,CASE WHEN artist_location IS NULL OR artist_location = '' THEN 1 ELSE 0 END
                            ,artist_name
                            ,artist_location
                )                                        AS occurrence
        FROM staging_songs
    ) AS ranked
    WHERE ranked.occurrence = 1
      AND NOT EXISTS (SELECT 1 FROM artists AS a WHERE a.artist_id = ranked.artist_id);"#;

// Each distinct play timestamp is computed once in the inner select.
// `dow` numbers Sunday as 0; `week` is the ISO-8601 week.
const TIME: &str = r#"INSERT INTO time (
        start_time
       ,hour
       ,day
       ,week
       ,month
       ,year
       ,weekday
    )
    SELECT  plays.start_time
           ,EXTRACT(hour FROM plays.start_time)   AS hour
           ,EXTRACT(day FROM plays.start_time)    AS day
           ,EXTRACT(week FROM plays.start_time)   AS week
           ,EXTRACT(month FROM plays.start_time)  AS month
           ,EXTRACT(year FROM plays.start_time)   AS year
           ,EXTRACT(dow FROM plays.start_time)    AS weekday
    FROM (
        SELECT DISTINCT TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second' AS start_time
        FROM staging_events
        WHERE page = 'NextSong'
    ) AS plays
    WHERE NOT EXISTS (SELECT 1 FROM time AS t WHERE t.start_time = plays.start_time);"#;

/// Transform statements in execution order
pub(crate) const TRANSFORMS: [(Table, &str); 5] = [
    (Table::Songplays, SONGPLAYS),
    (Table::Users, USERS),
    (Table::Songs, SONGS),
    (Table::Artists, ARTISTS),
    (Table::Time, TIME),
];
