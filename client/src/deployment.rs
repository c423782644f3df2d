// Hub Chain Connector
// Copyright (C) 2019 The Hub Chain Connector contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Deployment of the hub contracts.
//!
//! The hub consists of a challenge contract and a service contract. The service contract takes
//! the address of the challenge contract as its first constructor argument, so the two
//! deployments run one after the other.
use thiserror::Error as ThisError;

use crate::interface::*;

/// Artifacts of the two hub contracts.
#[derive(Clone, Debug)]
pub struct HubDeployment {
    pub challenge: ContractArtifact,
    pub service: ContractArtifact,
}

#[derive(Debug, ThisError)]
pub enum DeploymentError {
    /// Nothing was deployed
    #[error("Hub deployment aborted")]
    Aborted(#[source] Error),

    /// The challenge contract was deployed but the service contract was not
    ///
    /// Use [HubDeployment::resume] with the challenge address to finish the deployment.
    #[error("Challenge contract deployed at {challenge_address:?} but service deployment failed")]
    Partial {
        challenge_address: Address,
        #[source]
        source: Error,
    },
}

impl DeploymentError {
    /// Address of the challenge contract if it was deployed.
    pub fn challenge_address(&self) -> Option<Address> {
        match self {
            DeploymentError::Aborted(_) => None,
            DeploymentError::Partial {
                challenge_address, ..
            } => Some(*challenge_address),
        }
    }
}

impl HubDeployment {
    pub fn new(challenge: ContractArtifact, service: ContractArtifact) -> Self {
        HubDeployment { challenge, service }
    }

    /// Deploy the challenge contract and then the service contract bound to it.
    ///
    /// The service contract is constructed with the challenge address followed by
    /// `application_args`. Arguments that do not fit either constructor are rejected before
    /// anything is submitted.
    pub async fn deploy<C: ChainConnector + Sync>(
        &self,
        client: &C,
        account: &Account,
        application_args: Vec<ConstructorArg>,
    ) -> Result<Contract, DeploymentError> {
        self.service
            .interface
            .encode_constructor_args(&service_args(Address::zero(), application_args.clone()))
            .map_err(DeploymentError::Aborted)?;

        let challenge = client
            .deploy_contract(account, &self.challenge, Vec::new())
            .await
            .map_err(DeploymentError::Aborted)?;
        log::info!(
            "Deployed {} contract at {:?}",
            challenge.interface().name,
            challenge.address()
        );

        self.resume(client, account, challenge.address(), application_args)
            .await
    }

    /// Deploy only the service contract against an already deployed challenge contract.
    pub async fn resume<C: ChainConnector + Sync>(
        &self,
        client: &C,
        account: &Account,
        challenge_address: Address,
        application_args: Vec<ConstructorArg>,
    ) -> Result<Contract, DeploymentError> {
        let args = service_args(challenge_address, application_args);
        let service = client
            .deploy_contract(account, &self.service, args)
            .await
            .map_err(|source| DeploymentError::Partial {
                challenge_address,
                source,
            })?;
        log::info!(
            "Deployed {} contract at {:?}",
            service.interface().name,
            service.address()
        );
        Ok(service)
    }
}

fn service_args(
    challenge_address: Address,
    application_args: Vec<ConstructorArg>,
) -> Vec<ConstructorArg> {
    let mut args = vec![ConstructorArg::Address(challenge_address)];
    args.extend(application_args);
    args
}
