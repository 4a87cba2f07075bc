//! Solidity ABI Surface - Typed Bindings of the Remote Contracts
//!
//! Only the functions and events the client calls or inspects. The order
//! structs here carry the `sign` field and are the calldata layout of
//! `matchOrders`; the typed-data layout used for hashing lives in
//! `domain::order`.

use alloy::sol;

sol! {
  interface IexecPoco {
    struct EIP712Domain {
      string name;
      string version;
      uint256 chainId;
      address verifyingContract;
    }

    struct Account {
      uint256 stake;
      uint256 locked;
    }

    struct Category {
      string name;
      string description;
      uint256 workClockTimeRef;
    }

    struct AppOrder {
      address app;
      uint256 appprice;
      uint256 volume;
      bytes32 tag;
      address datasetrestrict;
      address workerpoolrestrict;
      address requesterrestrict;
      bytes32 salt;
      bytes sign;
    }

    struct DatasetOrder {
      address dataset;
      uint256 datasetprice;
      uint256 volume;
      bytes32 tag;
      address apprestrict;
      address workerpoolrestrict;
      address requesterrestrict;
      bytes32 salt;
      bytes sign;
    }

    struct WorkerpoolOrder {
      address workerpool;
      uint256 workerpoolprice;
      uint256 volume;
      bytes32 tag;
      uint256 category;
      uint256 trust;
      address apprestrict;
      address datasetrestrict;
      address requesterrestrict;
      bytes32 salt;
      bytes sign;
    }

    struct RequestOrder {
      address app;
      uint256 appmaxprice;
      address dataset;
      uint256 datasetmaxprice;
      address workerpool;
      uint256 workerpoolmaxprice;
      address requester;
      uint256 volume;
      bytes32 tag;
      uint256 category;
      uint256 trust;
      address beneficiary;
      address callback;
      string params;
      bytes32 salt;
      bytes sign;
    }

    struct AppOrderOperation {
      AppOrder order;
      uint8 operation;
      bytes sign;
    }

    struct DatasetOrderOperation {
      DatasetOrder order;
      uint8 operation;
      bytes sign;
    }

    struct WorkerpoolOrderOperation {
      WorkerpoolOrder order;
      uint8 operation;
      bytes sign;
    }

    struct RequestOrderOperation {
      RequestOrder order;
      uint8 operation;
      bytes sign;
    }

    event Transfer(address indexed from, address indexed to, uint256 value);
    event OrdersMatched(bytes32 dealid, bytes32 appHash, bytes32 datasetHash, bytes32 workerpoolHash, bytes32 requestHash, uint256 volume);
    event ClosedAppOrder(bytes32 appHash);
    event ClosedDatasetOrder(bytes32 datasetHash);
    event ClosedWorkerpoolOrder(bytes32 workerpoolHash);
    event ClosedRequestOrder(bytes32 requestHash);
    event SignedAppOrder(bytes32 appHash);
    event SignedDatasetOrder(bytes32 datasetHash);
    event SignedWorkerpoolOrder(bytes32 workerpoolHash);
    event SignedRequestOrder(bytes32 requestHash);

    function domain() external view returns (EIP712Domain memory);
    function token() external view returns (address);
    function appregistry() external view returns (address);
    function datasetregistry() external view returns (address);
    function workerpoolregistry() external view returns (address);
    function viewAccount(address account) external view returns (Account memory);
    function viewConsumed(bytes32 id) external view returns (uint256);
    function verifySignature(address identity, bytes32 hash, bytes calldata signature) external view returns (bool);
    function verifyPresignature(address identity, bytes32 hash) external view returns (bool);
    function countCategory() external view returns (uint256);
    function viewCategory(uint256 index) external view returns (Category memory);

    function deposit() external payable returns (bool);
    function withdraw(uint256 amount) external returns (bool);
    function matchOrders(AppOrder calldata appOrder, DatasetOrder calldata datasetOrder, WorkerpoolOrder calldata workerpoolOrder, RequestOrder calldata requestOrder) external returns (bytes32);
    function manageAppOrder(AppOrderOperation calldata operation) external;
    function manageDatasetOrder(DatasetOrderOperation calldata operation) external;
    function manageWorkerpoolOrder(WorkerpoolOrderOperation calldata operation) external;
    function manageRequestOrder(RequestOrderOperation calldata operation) external;
  }
}

sol! {
  interface IexecToken {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);

    function balanceOf(address owner) external view returns (uint256);
    function transfer(address to, uint256 value) external returns (bool);
    function approveAndCall(address spender, uint256 value, bytes calldata extraData) external returns (bool);
    function isKYC(address account) external view returns (bool);
    function withdraw(uint256 amount) external;
  }
}

sol! {
  interface IexecRegistry {
    function isRegistered(address entry) external view returns (bool);
  }
}

sol! {
  interface Ownable {
    function owner() external view returns (address);
  }
}

sol! {
  interface IexecBridge {
    event UserRequestForSignature(address recipient, uint256 value);
    event AffirmationCompleted(address recipient, uint256 value, bytes32 transactionHash);
    event RelayedMessage(address recipient, uint256 value, bytes32 transactionHash);

    function minPerTx() external view returns (uint256);
    function maxPerTx() external view returns (uint256);
    function dailyLimit() external view returns (uint256);
    function getCurrentDay() external view returns (uint256);
  }
}
