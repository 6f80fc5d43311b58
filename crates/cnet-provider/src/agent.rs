//! Provider message loop.

use cnet_proto::{CoordinatorMessage, ProviderMessage, Task};
use cnet_transport::{Address, Envelope, Mailbox, Switchboard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::state::ProviderState;

/// A provider agent: state plus a mailbox on the switchboard.
///
/// The agent processes incoming messages sequentially, one at a time, and
/// replies to whoever sent the message. The loop ends when the mailbox
/// closes.
#[derive(Debug)]
pub struct ProviderAgent {
    state: ProviderState,
    address: Address,
    mailbox: Mailbox,
    switchboard: Switchboard,
}

impl ProviderAgent {
    /// Attach a new agent for the given state to a switchboard.
    ///
    /// The agent's transport address is its provider id.
    #[must_use]
    pub fn attach(state: ProviderState, switchboard: &Switchboard) -> Self {
        let address = Address::new(state.id().as_str());
        let mailbox = switchboard.attach(address.clone());
        Self {
            state,
            address,
            mailbox,
            switchboard: switchboard.clone(),
        }
    }

    /// The agent's transport address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Spawn the agent onto the runtime. The handle resolves to the final
    /// provider state once the loop ends.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<ProviderState> {
        tokio::spawn(self.run())
    }

    /// Run the message loop until the mailbox closes, returning the final
    /// provider state.
    pub async fn run(mut self) -> ProviderState {
        while let Some(envelope) = self.mailbox.recv().await {
            // Fail closed on anything that is not a well-formed coordinator
            // message; a malformed payload is dropped, never evaluated.
            let msg = match CoordinatorMessage::from_json(&envelope.payload) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(provider = %self.state.id(), from = %envelope.from, error = %e,
                          "dropping undecodable message");
                    continue;
                }
            };

            if let Err(e) = self.handle(envelope.from.clone(), msg).await {
                warn!(provider = %self.state.id(), from = %envelope.from, error = %e,
                      "failed to reply");
            }
        }
        debug!(provider = %self.state.id(), "mailbox closed, provider loop ending");
        self.state
    }

    async fn handle(&mut self, from: Address, msg: CoordinatorMessage) -> Result<(), ProviderError> {
        match msg {
            CoordinatorMessage::Cfp {
                round_id,
                destination,
            } => {
                let task = Task::new(round_id, destination);
                let reply = self.state.evaluate(&task);
                self.reply(from, &reply).await
            }
            CoordinatorMessage::Accept { round_id } => {
                let ack = self.state.on_award(round_id);
                self.reply(from, &ack).await
            }
            CoordinatorMessage::Reject { round_id } => {
                self.state.on_rejection(round_id);
                Ok(())
            }
        }
    }

    async fn reply(&self, to: Address, msg: &ProviderMessage) -> Result<(), ProviderError> {
        let payload = msg.to_json()?;
        self.switchboard
            .send(Envelope::new(self.address.clone(), to, payload))
            .await?;
        Ok(())
    }
}
