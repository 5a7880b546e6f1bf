//! League-manager-specific re-export surface: the recognized RPC bodies live
//! in `league_protocol::messages` since referees and players share them too.

pub use league_protocol::messages::{
    AssignMatchRequest, AssignMatchResponse, LeagueQueryKind, LeagueQueryRequest, LeagueQueryResponse,
    MatchResultReportRequest, MatchResultReportResponse, RegisterPlayerRequest, RegisterRefereeRequest,
    RegisterResponse, RegistrationStatus, RoundAnnouncementAck, RoundAnnouncementBody, StandingRow,
    StartLeagueRequest, StartLeagueResponse,
};
