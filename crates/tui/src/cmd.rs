//! # Command Execution Layer
//!
//! This module translates high-level application effects (`Effect`) into
//! imperative commands (`Cmd`) and executes them against the directory
//! service. It is the boundary where pure state transitions meet I/O.
//!
//! ## Design
//! - [`Cmd`] is the effectful command type (one directory call each).
//! - [`from_effects`] applies effects that only touch local state (history,
//!   focus, logs) and turns the rest into [`Cmd`]s.
//! - [`run_cmds`] spawns every command as a task whose [`ExecOutcome`] is
//!   joined back into the event loop.
//!
//! This design follows a **functional core, imperative shell** pattern:
//! state updates are pure, but commands handle side effects.

use std::sync::Arc;

use murmur_api::DirectoryService;
use murmur_types::{Channel, Effect, ExecOutcome};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::App;

/// Represents side-effectful directory calls executed outside of pure state
/// updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Fetch one page of profiles, team scoped when `team_id` is set.
    LoadProfiles {
        page: usize,
        per_page: usize,
        team_id: Option<String>,
    },
    LoadTotalUsers,
    /// Fetch presence for exactly these users.
    LoadStatuses(Vec<String>),
    LoadGroupMembers(Channel),
    /// Profile and group-conversation search, run concurrently.
    SearchDirectory {
        request_id: u64,
        term: String,
        team_id: Option<String>,
    },
    OpenDirect(String),
    OpenGroup(Vec<String>),
}

/// Convert application [`Effect`]s into [`Cmd`]s.
///
/// Effects that only change local state are applied here directly.
/// Navigation effects (`ShowModal`, `CloseModal`) belong to the
/// runtime and are expected to be extracted before this is called.
pub fn from_effects(app: &mut App, effects: Vec<Effect>) -> Vec<Cmd> {
    let mut commands = Vec::new();

    for effect in effects {
        match effect {
            Effect::Navigate(location) => {
                app.append_log_message(format!("Opened {location}"));
                app.history.push(location);
            }
            Effect::RestoreFocus(name) => app.pending_focus = Some(name),
            Effect::Log(line) => app.append_log_message(line),
            Effect::LoadProfiles { page, per_page, team_id } => commands.push(Cmd::LoadProfiles { page, per_page, team_id }),
            Effect::LoadTotalUsersStats => commands.push(Cmd::LoadTotalUsers),
            Effect::LoadProfilesMissingStatus(user_ids) => {
                let missing = app.directory.missing_status(&user_ids);
                if !missing.is_empty() {
                    commands.push(Cmd::LoadStatuses(missing));
                }
            }
            Effect::LoadStatusesForProfiles(user_ids) => {
                if !user_ids.is_empty() {
                    commands.push(Cmd::LoadStatuses(user_ids));
                }
            }
            Effect::LoadProfilesForGroupChannels(channels) => {
                commands.extend(channels.into_iter().map(Cmd::LoadGroupMembers));
            }
            Effect::SearchDirectory { request_id, term, team_id } => {
                commands.push(Cmd::SearchDirectory { request_id, term, team_id });
            }
            Effect::OpenDirectChannel(user_id) => commands.push(Cmd::OpenDirect(user_id)),
            Effect::OpenGroupChannel(user_ids) => commands.push(Cmd::OpenGroup(user_ids)),
            Effect::ShowModal(_) | Effect::CloseModal => {
                debug!(?effect, "navigation effect reached the command layer; ignoring");
            }
        }
    }

    commands
}

/// Spawn every command; each handle resolves to the command's outcome.
pub fn run_cmds(app: &App, commands: Vec<Cmd>) -> Vec<JoinHandle<ExecOutcome>> {
    commands
        .into_iter()
        .map(|command| {
            let service = Arc::clone(&app.ctx.service);
            let current_user_id = app.ctx.current_user.id.clone();
            tokio::spawn(async move { execute(service.as_ref(), &current_user_id, command).await })
        })
        .collect()
}

/// Run one command to completion. Failures are carried in the outcome.
pub async fn execute(service: &dyn DirectoryService, current_user_id: &str, command: Cmd) -> ExecOutcome {
    debug!(?command, "executing");
    match command {
        Cmd::LoadProfiles { page, per_page, team_id } => {
            let result = match team_id.as_deref() {
                Some(team_id) => service.get_profiles_in_team(team_id, page, per_page).await,
                None => service.get_profiles(page, per_page).await,
            };
            ExecOutcome::ProfilesPage { page, result }
        }
        Cmd::LoadTotalUsers => ExecOutcome::TotalUsers(service.get_total_users_count().await),
        Cmd::LoadStatuses(user_ids) => ExecOutcome::Statuses(service.get_statuses_by_ids(&user_ids).await),
        Cmd::LoadGroupMembers(channel) => ExecOutcome::GroupMembers {
            result: service.get_profiles_in_channel(&channel.id).await,
            channel_id: channel.id,
        },
        Cmd::SearchDirectory { request_id, term, team_id } => {
            let (profiles, groups) = tokio::join!(
                service.search_profiles(&term, team_id.as_deref()),
                service.search_group_channels(&term)
            );
            ExecOutcome::DirectorySearch {
                request_id,
                term,
                profiles,
                groups,
            }
        }
        Cmd::OpenDirect(user_id) => ExecOutcome::ChannelOpened(service.create_direct_channel(current_user_id, &user_id).await),
        Cmd::OpenGroup(user_ids) => ExecOutcome::ChannelOpened(service.create_group_channel(&user_ids).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use murmur_api::{DirectoryCall, MemoryDirectory};
    use murmur_types::{ActionError, ChannelType, UserStatus};

    #[test]
    fn local_effects_apply_without_commands() {
        let (mut app, ..) = test_app();
        let commands = from_effects(
            &mut app,
            vec![
                Effect::Log("hello".into()),
                Effect::Navigate("/team1/channels/dm".into()),
                Effect::RestoreFocus("channel.direct_messages".into()),
            ],
        );
        assert!(commands.is_empty());
        assert_eq!(app.current_location(), Some("/team1/channels/dm"));
        assert_eq!(app.pending_focus.as_deref(), Some("channel.direct_messages"));
        assert!(app.logs.entries.iter().any(|line| line == "hello"));
    }

    #[test]
    fn missing_statuses_are_filtered_and_groups_fan_out() {
        let (mut app, ..) = test_app();
        app.directory.merge_statuses(&[UserStatus {
            user_id: "u-ada".into(),
            status: "online".into(),
        }]);
        let groups = vec![
            Channel {
                id: "g-compilers".into(),
                ..Channel::default()
            },
            Channel {
                id: "g-unix".into(),
                ..Channel::default()
            },
        ];
        let commands = from_effects(
            &mut app,
            vec![
                Effect::LoadProfilesMissingStatus(vec!["u-ada".into(), "u-ken".into()]),
                Effect::LoadProfilesMissingStatus(vec!["u-ada".into()]),
                Effect::LoadStatusesForProfiles(vec!["u-ada".into()]),
                Effect::LoadProfilesForGroupChannels(groups.clone()),
            ],
        );
        assert_eq!(
            commands,
            vec![
                Cmd::LoadStatuses(vec!["u-ken".into()]),
                Cmd::LoadStatuses(vec!["u-ada".into()]),
                Cmd::LoadGroupMembers(groups[0].clone()),
                Cmd::LoadGroupMembers(groups[1].clone()),
            ]
        );
    }

    #[tokio::test]
    async fn team_scoped_page_uses_team_endpoint() {
        let directory = MemoryDirectory::demo();
        let outcome = execute(
            &directory,
            "u-me",
            Cmd::LoadProfiles {
                page: 0,
                per_page: 50,
                team_id: Some("t1".into()),
            },
        )
        .await;
        let ExecOutcome::ProfilesPage { page: 0, result: Ok(profiles) } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(profiles.iter().all(|user| user.id != "u-radia"));
        assert_eq!(
            directory.calls(),
            vec![DirectoryCall::GetProfilesInTeam {
                team_id: "t1".into(),
                page: 0,
                per_page: 50,
            }]
        );
    }

    #[tokio::test]
    async fn search_runs_profile_and_group_queries() {
        let directory = MemoryDirectory::demo();
        let outcome = execute(
            &directory,
            "u-me",
            Cmd::SearchDirectory {
                request_id: 3,
                term: "grace".into(),
                team_id: None,
            },
        )
        .await;
        let ExecOutcome::DirectorySearch {
            request_id: 3,
            profiles: Ok(profiles),
            groups: Ok(groups),
            ..
        } = outcome
        else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(profiles.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["u-grace"]);
        assert_eq!(groups.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(), ["g-compilers"]);
    }

    #[tokio::test]
    async fn opens_direct_and_group_conversations() {
        let directory = MemoryDirectory::demo();
        let direct = execute(&directory, "u-me", Cmd::OpenDirect("u-ada".into())).await;
        assert!(matches!(direct, ExecOutcome::ChannelOpened(Ok(ref channel)) if channel.channel_type == ChannelType::Direct));

        let group = execute(&directory, "u-me", Cmd::OpenGroup(vec!["u-ken".into(), "u-dennis".into()])).await;
        let ExecOutcome::ChannelOpened(Ok(channel)) = group else {
            panic!("unexpected outcome {group:?}");
        };
        assert_eq!(channel.id, "g-unix", "an existing group with the same members is reused");

        directory.fail_channel_opens(ActionError::Server {
            status: 500,
            message: "boom".into(),
        });
        let failed = execute(&directory, "u-me", Cmd::OpenDirect("u-ada".into())).await;
        assert!(matches!(failed, ExecOutcome::ChannelOpened(Err(ActionError::Server { status: 500, .. }))));
    }
}
