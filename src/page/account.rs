// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The account page keeps a profile form in step with the session and the
//! profile store.
//!
//! Every await is raced against the page's [`CancellationToken`], and nothing
//! that settles after the page has been unmounted is applied to it.

use chrono::Utc;
use log::{debug, error, info};
use tokio::{select, sync::watch};
use tokio_util::sync::CancellationToken;

use crate::{
    config,
    error::{Error, Internal, Result, Validation},
    guard::{self, Decision, Policy},
    identity::IdentityClient,
    navigation::{Navigator, Route},
    notifier::Notifier,
    profile::{self, Draft, Profile, ProfileStore},
    session::{Identity, Status},
};

use super::{admit, Admission, Phase, State};

pub(crate) const UPDATED: &str = "Profile updated!";
pub(crate) const UPDATE_FAILED: &str = "Profile update failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Submission {
    Saved(Profile),
    Rejected(Validation),
    Failed,
    /// The page went away before the store answered.
    Discarded,
}

pub(crate) struct Account<I, P, N>
where
    I: IdentityClient,
    P: ProfileStore,
    N: Navigator,
{
    // Owns the sender side of `session`.
    _identity: I,
    profiles: P,
    navigator: N,
    notifications: config::Notifications,
    session: watch::Receiver<Status>,
    lifetime: CancellationToken,
    state: State,
    owner: Option<Identity>,
    form: Draft,
    notifier: Notifier,
}

impl<I, P, N> Account<I, P, N>
where
    I: IdentityClient,
    P: ProfileStore,
    N: Navigator,
{
    pub(crate) fn new(
        identity: I,
        profiles: P,
        navigator: N,
        notifications: config::Notifications,
    ) -> Self {
        let session = identity.subscribe();
        Self {
            _identity: identity,
            profiles,
            navigator,
            notifications,
            session,
            lifetime: CancellationToken::new(),
            state: State::Idle,
            owner: None,
            form: Draft::default(),
            notifier: Notifier::new(),
        }
    }

    /// A handle that unmounts the page when cancelled.
    // LINT: Used by front ends that keep the page mounted; commands unmount
    // directly.
    #[allow(dead_code)]
    pub(crate) fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub(crate) fn unmount(&self) {
        self.lifetime.cancel();
    }

    /// Runs the guard, then loads the profile of the signed-in identity.
    pub(crate) async fn mount(&mut self) -> Result<State> {
        self.state = State::Redirecting;
        match admit(
            &mut self.session,
            Policy::RequiresAuth,
            &self.navigator,
            &self.lifetime,
        )
        .await?
        {
            Admission::Allowed(status) => match status.identity() {
                Some(identity) => self.load(identity.clone()).await,
                None => Ok(self.state),
            },
            Admission::Redirected | Admission::Unmounted => Ok(self.state),
        }
    }

    /// Tries the initial load again after it failed.
    pub(crate) async fn reload(&mut self) -> Result<State> {
        match (self.state, self.owner.clone()) {
            (State::Loading(Phase::Initial), Some(owner)) => self.load(owner).await,
            _ => Ok(self.state),
        }
    }

    /// Re-runs the guard whenever the session changes, until the page is
    /// unmounted. A different identity gets its own profile loaded.
    // LINT: See `lifetime`.
    #[allow(dead_code)]
    pub(crate) async fn follow_session(&mut self) -> Result<()> {
        loop {
            select! {
                biased;
                () = self.lifetime.cancelled() => return Ok(()),
                changed = self.session.changed() => changed.map_err(Internal::from)?,
            }

            let status = self.session.borrow_and_update().clone();
            match guard::evaluate(&status, Policy::RequiresAuth) {
                Decision::Allow => {
                    if let Some(identity) = status.identity() {
                        if self.owner.as_ref().map(|owner| owner.id) != Some(identity.id) {
                            info!("Session changed to {}; reloading profile", identity.email);
                            let _ = self.load(identity.clone()).await?;
                        }
                    }
                }
                Decision::Redirecting { to } => {
                    self.owner = None;
                    self.form = Draft::default();
                    self.state = State::Redirecting;
                    if let Some(route) = to {
                        self.navigator.redirect_to(route);
                    }
                }
            }
        }
    }

    async fn load(&mut self, identity: Identity) -> Result<State> {
        self.state = State::Loading(Phase::Initial);
        self.owner = Some(identity.clone());
        self.form = Draft::default();

        debug!("Loading profile for {}", identity.id);
        let result = select! {
            biased;
            () = self.lifetime.cancelled() => {
                debug!("Page unmounted while loading profile {}; discarding", identity.id);
                return Ok(self.state);
            }
            result = self.profiles.get(identity.id) => result,
        };

        match result {
            Ok(Some(profile)) => {
                self.form = Draft::from(&profile);
                self.state = State::Ready;
            }
            Ok(None) => {
                info!("No profile for {} yet", identity.id);
                self.state = State::RedirectingToOnboarding;
                self.navigator.redirect_to(Route::GetStarted);
            }
            Err(err) => {
                // Stays in the loading state until the next mount or reload.
                error!("Could not load profile for {}: {}", identity.id, err);
            }
        }
        Ok(self.state)
    }

    pub(crate) const fn inputs_enabled(&self) -> bool {
        matches!(self.state, State::Ready)
    }

    pub(crate) fn set_first_name(&mut self, value: &str) -> Result<()> {
        self.ensure_enabled()?;
        self.form.first_name = profile::capitalize_first(&profile::remove_whitespace(value));
        Ok(())
    }

    pub(crate) fn set_last_name(&mut self, value: &str) -> Result<()> {
        self.ensure_enabled()?;
        self.form.last_name = profile::capitalize_first(&profile::remove_whitespace(value));
        Ok(())
    }

    pub(crate) fn set_avatar_url(&mut self, value: &str) -> Result<()> {
        self.ensure_enabled()?;
        value.clone_into(&mut self.form.avatar_url);
        Ok(())
    }

    /// Submits the form as it currently stands.
    pub(crate) async fn submit(&mut self) -> Result<Submission> {
        self.update(self.form.clone()).await
    }

    /// Stores a freshly uploaded avatar together with the names already in
    /// the form.
    pub(crate) async fn upload_avatar(&mut self, avatar_url: &str) -> Result<Submission> {
        self.ensure_enabled()?;
        self.form.avatar_url = avatar_url.to_owned();
        self.update(self.form.clone()).await
    }

    pub(crate) async fn update(&mut self, draft: Draft) -> Result<Submission> {
        self.ensure_enabled()?;
        let owner = self.owner.clone().ok_or(Error::NotSignedIn)?;

        if let Err(validation) = draft.validate() {
            self.notifier
                .show(&validation.to_string(), self.notifications.validation());
            return Ok(Submission::Rejected(validation));
        }

        let profile = draft.into_profile(owner.id, Utc::now());
        self.state = State::Loading(Phase::Submission);
        let result = select! {
            biased;
            () = self.lifetime.cancelled() => {
                debug!("Page unmounted while saving profile {}; discarding", owner.id);
                return Ok(Submission::Discarded);
            }
            result = self.profiles.put(&profile) => result,
        };
        self.state = State::Ready;

        match result {
            Ok(()) => {
                self.form = Draft::from(&profile);
                self.notifier.show(UPDATED, self.notifications.update());
                Ok(Submission::Saved(profile))
            }
            Err(err) => {
                error!("Could not save profile for {}: {}", owner.id, err);
                self.notifier.show(UPDATE_FAILED, self.notifications.update());
                Ok(Submission::Failed)
            }
        }
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.inputs_enabled() {
            Ok(())
        } else {
            Err(Error::InputsDisabled)
        }
    }

    pub(crate) const fn state(&self) -> State {
        self.state
    }

    pub(crate) const fn form(&self) -> &Draft {
        &self.form
    }

    pub(crate) fn email(&self) -> Option<&str> {
        self.owner.as_ref().map(|owner| owner.email.as_str())
    }

    /// The message to show under the form. Nothing shows while loading or
    /// saving.
    pub(crate) fn status_message(&self) -> Option<String> {
        if self.state.is_loading() {
            None
        } else {
            self.notifier.current()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use uuid::Uuid;

    use super::*;
    use crate::{
        identity::testing::Fake as FakeIdentity,
        navigation::testing::Recorder,
        profile::testing::Fake as FakeStore,
        session::Session,
    };

    type Page = Account<Arc<FakeIdentity>, Arc<FakeStore>, Arc<Recorder>>;

    fn identity(email: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: email.to_owned(),
        }
    }

    fn signed_in(identity: &Identity) -> Status {
        Status::Resolved(Session::Present(identity.clone()))
    }

    fn stored(identity: &Identity, first_name: &str, last_name: &str) -> Profile {
        Profile {
            id: identity.id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            avatar_url: String::new(),
            updated_at: Utc::now(),
        }
    }

    struct Harness {
        identity: Arc<FakeIdentity>,
        store: Arc<FakeStore>,
        navigator: Arc<Recorder>,
        page: Page,
    }

    fn harness(status: Status, store: FakeStore) -> Harness {
        let identity = Arc::new(FakeIdentity::new(status));
        let store = Arc::new(store);
        let navigator = Arc::new(Recorder::default());
        let page = Account::new(
            Arc::clone(&identity),
            Arc::clone(&store),
            Arc::clone(&navigator),
            config::Notifications::default(),
        );
        Harness {
            identity,
            store,
            navigator,
            page,
        }
    }

    #[tokio::test]
    async fn signed_out_visitor_goes_to_sign_in() -> Result<()> {
        let mut h = harness(Status::Resolved(Session::Absent), FakeStore::default());

        assert_eq!(h.page.mount().await?, State::Redirecting);
        assert_eq!(h.navigator.routes(), vec![Route::SignIn]);
        assert_eq!(h.store.reads(), 0);
        assert!(!h.page.inputs_enabled());
        Ok(())
    }

    #[tokio::test]
    async fn missing_profile_goes_to_onboarding() -> Result<()> {
        let u1 = identity("u1@example.com");
        let mut h = harness(signed_in(&u1), FakeStore::default());

        assert_eq!(h.page.mount().await?, State::RedirectingToOnboarding);
        assert_eq!(h.navigator.routes(), vec![Route::GetStarted]);
        assert!(!h.page.inputs_enabled());
        assert!(h.store.writes().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn existing_profile_fills_form() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));

        assert!(!h.page.inputs_enabled());
        assert_eq!(h.page.mount().await?, State::Ready);
        assert!(h.page.inputs_enabled());
        assert_eq!(
            h.page.form(),
            &Draft {
                first_name: "Ann".to_owned(),
                last_name: "Lee".to_owned(),
                avatar_url: String::new(),
            }
        );
        assert_eq!(h.page.email(), Some("u2@example.com"));
        assert_eq!(h.store.reads(), 1);
        assert!(h.navigator.routes().is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pending_session_waits_before_loading() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(Status::Pending, FakeStore::with([stored(&u2, "Ann", "Lee")]));

        let identity = Arc::clone(&h.identity);
        let resolved = signed_in(&u2);
        let (state, ()) = tokio::join!(h.page.mount(), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            identity.set(resolved);
        });

        assert_eq!(state?, State::Ready);
        assert_eq!(h.store.reads(), 1);
        assert!(h.navigator.routes().is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unmounted_page_ignores_late_profile() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(
            signed_in(&u2),
            FakeStore::with([stored(&u2, "Ann", "Lee")]).delayed(Duration::from_secs(1)),
        );

        let lifetime = h.page.lifetime();
        let (state, ()) = tokio::join!(h.page.mount(), async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            lifetime.cancel();
        });

        assert_eq!(state?, State::Loading(Phase::Initial));
        assert_eq!(h.page.form(), &Draft::default());
        assert!(!h.page.inputs_enabled());
        Ok(())
    }

    #[tokio::test]
    async fn failed_load_stays_loading_until_reload() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        h.store.fail_reads(true);

        assert_eq!(h.page.mount().await?, State::Loading(Phase::Initial));
        assert!(!h.page.inputs_enabled());
        assert!(matches!(
            h.page.set_first_name("Bob"),
            Err(Error::InputsDisabled)
        ));
        assert!(matches!(h.page.submit().await, Err(Error::InputsDisabled)));
        assert_eq!(h.page.status_message(), None);

        h.store.fail_reads(false);
        assert_eq!(h.page.reload().await?, State::Ready);
        assert_eq!(h.page.form().first_name, "Ann");
        assert_eq!(h.store.reads(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn validation_rejects_without_saving() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        let cases = [
            ("", "x", Validation::FirstNameMissing),
            ("x", "", Validation::LastNameMissing),
            ("", "", Validation::FirstNameMissing),
        ];
        for (first_name, last_name, expected) in cases {
            let submission = h
                .page
                .update(Draft {
                    first_name: first_name.to_owned(),
                    last_name: last_name.to_owned(),
                    avatar_url: String::new(),
                })
                .await?;
            assert_eq!(submission, Submission::Rejected(expected));
            assert_eq!(h.page.state(), State::Ready);
            assert_eq!(h.page.status_message(), Some(expected.to_string()));
        }
        assert!(h.store.writes().await.is_empty());

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(h.page.status_message(), None);
        Ok(())
    }

    #[tokio::test]
    async fn update_normalizes_and_reports_success() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        let submission = h
            .page
            .update(Draft {
                first_name: "  john ".to_owned(),
                last_name: "mARY".to_owned(),
                avatar_url: "avatars/u2.png".to_owned(),
            })
            .await?;

        let Submission::Saved(saved) = submission else {
            panic!("expected the profile to be saved, got {submission:?}");
        };
        assert_eq!(saved.id, u2.id);
        assert_eq!(saved.first_name, "John");
        assert_eq!(saved.last_name, "MARY");
        assert_eq!(saved.avatar_url, "avatars/u2.png");
        assert_eq!(h.store.writes().await, vec![saved]);
        assert_eq!(h.page.state(), State::Ready);
        assert_eq!(h.page.status_message().as_deref(), Some(UPDATED));
        Ok(())
    }

    #[tokio::test]
    async fn repeated_update_writes_twice() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        let _ = h.page.submit().await?;
        let _ = h.page.submit().await?;

        let writes = h.store.writes().await;
        assert_eq!(writes.len(), 2);
        assert!(writes[1].updated_at >= writes[0].updated_at);
        assert_eq!(writes[0].id, writes[1].id);
        assert_eq!(writes[0].first_name, writes[1].first_name);
        assert_eq!(writes[0].last_name, writes[1].last_name);
        Ok(())
    }

    #[tokio::test]
    async fn failed_update_is_reported() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;
        h.store.fail_writes(true);

        assert_eq!(h.page.submit().await?, Submission::Failed);
        assert_eq!(h.page.state(), State::Ready);
        assert!(h.page.inputs_enabled());
        assert_eq!(h.page.status_message().as_deref(), Some(UPDATE_FAILED));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn message_hidden_while_saving() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(
            signed_in(&u2),
            FakeStore::with([stored(&u2, "Ann", "Lee")]).delayed(Duration::from_millis(100)),
        );
        let _ = h.page.mount().await?;

        let _ = h.page.submit().await?;
        assert_eq!(h.page.status_message().as_deref(), Some(UPDATED));

        // Hold the store in the middle of a save by unmounting mid-flight.
        let lifetime = h.page.lifetime();
        let (submission, ()) = tokio::join!(h.page.submit(), async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            lifetime.cancel();
        });
        assert_eq!(submission?, Submission::Discarded);
        assert_eq!(h.page.state(), State::Loading(Phase::Submission));
        assert_eq!(h.page.status_message(), None);
        Ok(())
    }

    #[tokio::test]
    async fn avatar_upload_saves_with_current_names() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        h.page.set_last_name(" park ")?;
        let submission = h.page.upload_avatar("avatars/new.png").await?;

        let Submission::Saved(saved) = submission else {
            panic!("expected the profile to be saved, got {submission:?}");
        };
        assert_eq!(saved.first_name, "Ann");
        assert_eq!(saved.last_name, "Park");
        assert_eq!(saved.avatar_url, "avatars/new.png");
        assert_eq!(h.page.form().avatar_url, "avatars/new.png");
        Ok(())
    }

    #[tokio::test]
    async fn rejected_avatar_upload_keeps_new_url() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "", "Lee")]));
        let _ = h.page.mount().await?;

        let submission = h.page.upload_avatar("avatars/new.png").await?;

        assert_eq!(
            submission,
            Submission::Rejected(Validation::FirstNameMissing)
        );
        assert!(h.store.writes().await.is_empty());
        assert_eq!(h.page.form().avatar_url, "avatars/new.png");
        assert_eq!(h.page.state(), State::Ready);
        assert_eq!(
            h.page.status_message(),
            Some(Validation::FirstNameMissing.to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn edited_form_submits_as_is() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        h.page.set_first_name("bob")?;
        h.page.set_avatar_url("avatars/bob.png")?;
        let submission = h.page.submit().await?;

        let Submission::Saved(saved) = submission else {
            panic!("expected the profile to be saved, got {submission:?}");
        };
        assert_eq!(saved.first_name, "Bob");
        assert_eq!(saved.last_name, "Lee");
        assert_eq!(saved.avatar_url, "avatars/bob.png");
        assert_eq!(h.store.writes().await, vec![saved]);
        Ok(())
    }

    #[tokio::test]
    async fn sign_out_while_mounted_redirects() -> Result<()> {
        let u2 = identity("u2@example.com");
        let mut h = harness(signed_in(&u2), FakeStore::with([stored(&u2, "Ann", "Lee")]));
        let _ = h.page.mount().await?;

        let identity = Arc::clone(&h.identity);
        let lifetime = h.page.lifetime();
        let (followed, ()) = tokio::join!(h.page.follow_session(), async move {
            identity.set(Status::Resolved(Session::Absent));
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            lifetime.cancel();
        });

        followed?;
        assert_eq!(h.page.state(), State::Redirecting);
        assert_eq!(h.page.form(), &Draft::default());
        assert_eq!(h.navigator.routes(), vec![Route::SignIn]);
        Ok(())
    }

    #[tokio::test]
    async fn new_identity_loads_its_own_profile() -> Result<()> {
        let ann = identity("ann@example.com");
        let bob = identity("bob@example.com");
        let mut h = harness(
            signed_in(&ann),
            FakeStore::with([stored(&ann, "Ann", "Lee"), stored(&bob, "Bob", "Kim")]),
        );
        let _ = h.page.mount().await?;

        let identity = Arc::clone(&h.identity);
        let lifetime = h.page.lifetime();
        let switched = signed_in(&bob);
        let (followed, ()) = tokio::join!(h.page.follow_session(), async move {
            identity.set(switched);
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            lifetime.cancel();
        });

        followed?;
        assert_eq!(h.page.email(), Some("bob@example.com"));
        assert_eq!(h.page.form().first_name, "Bob");
        assert_eq!(h.store.reads(), 2);
        Ok(())
    }
}
